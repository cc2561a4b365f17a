//! Persisted value type.

use serde::{Deserialize, Serialize};

/// A single coordination value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreEntry {
    pub value: String,
    /// Unix timestamp (seconds) of the last write.
    pub updated_at: u64,
}

/// Build the composite table key for a namespaced entry.
pub fn table_key(namespace: &str, key: &str) -> String {
    format!("{namespace}/{key}")
}
