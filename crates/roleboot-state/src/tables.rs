//! redb table definitions for the roleboot state store.

use redb::TableDefinition;

/// Coordination entries keyed by `{namespace}/{key}`.
pub const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");
