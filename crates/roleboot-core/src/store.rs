//! Coordination store contract.
//!
//! The store is the shared key/value space cluster members use to exchange
//! bootstrap metadata. Backends own networking, replication and timeouts;
//! every call is expected to return within a bounded time.

use crate::error::StoreResult;

/// Namespaced key/value store shared across the cluster.
pub trait CoordinationStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key has not been published.
    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, namespace: &str, key: &str, value: &str) -> StoreResult<()>;
}
