//! StateStore — redb-backed coordination entries.
//!
//! Provides namespaced get/set/delete/list over a single table. Values are
//! JSON-serialized [`StoreEntry`] records. The store supports both on-disk
//! and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use roleboot_core::{CoordinationStore, StoreResult};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::ENTRIES;
use crate::types::{StoreEntry, table_key};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get the full entry for a namespaced key.
    pub fn get_entry(&self, namespace: &str, key: &str) -> StateResult<Option<StoreEntry>> {
        validate(namespace, key)?;
        let k = table_key(namespace, key);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        match table.get(k.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let entry: StoreEntry =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Get a value. Returns `None` if the key was never written.
    pub fn get_value(&self, namespace: &str, key: &str) -> StateResult<Option<String>> {
        Ok(self.get_entry(namespace, key)?.map(|e| e.value))
    }

    /// Insert or replace a value (last write wins).
    pub fn put_value(&self, namespace: &str, key: &str, value: &str) -> StateResult<()> {
        validate(namespace, key)?;
        let k = table_key(namespace, key);
        let entry = StoreEntry {
            value: value.to_string(),
            updated_at: epoch_secs(),
        };
        let bytes = serde_json::to_vec(&entry).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
            table
                .insert(k.as_str(), bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(key = %k, "entry stored");
        Ok(())
    }

    /// Delete an entry. Returns true if it existed.
    pub fn delete(&self, namespace: &str, key: &str) -> StateResult<bool> {
        validate(namespace, key)?;
        let k = table_key(namespace, key);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
            existed = table.remove(k.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(key = %k, existed, "entry deleted");
        Ok(existed)
    }

    /// List `(key, value)` pairs within a namespace, ordered by key.
    pub fn list_namespace(&self, namespace: &str) -> StateResult<Vec<(String, String)>> {
        validate_namespace(namespace)?;
        let prefix = format!("{namespace}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if let Some(k) = key.value().strip_prefix(&prefix) {
                let e: StoreEntry =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push((k.to_string(), e.value));
            }
        }
        Ok(results)
    }
}

impl CoordinationStore for StateStore {
    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get_value(namespace, key)?)
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> StoreResult<()> {
        Ok(self.put_value(namespace, key, value)?)
    }
}

fn validate_namespace(namespace: &str) -> StateResult<()> {
    if namespace.is_empty() || namespace.contains('/') {
        return Err(StateError::InvalidKey {
            namespace: namespace.to_string(),
            key: String::new(),
        });
    }
    Ok(())
}

fn validate(namespace: &str, key: &str) -> StateResult<()> {
    validate_namespace(namespace).map_err(|_| StateError::InvalidKey {
        namespace: namespace.to_string(),
        key: key.to_string(),
    })?;
    if key.is_empty() {
        return Err(StateError::InvalidKey {
            namespace: namespace.to_string(),
            key: key.to_string(),
        });
    }
    Ok(())
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roleboot_core::StoreError;

    fn test_store() -> StateStore {
        StateStore::open_in_memory().unwrap()
    }

    #[test]
    fn put_and_get() {
        let store = test_store();
        store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();

        let value = store.get_value("cluster", "leader-address").unwrap();
        assert_eq!(value.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = test_store();
        assert!(store.get_value("cluster", "leader-address").unwrap().is_none());
    }

    #[test]
    fn last_write_wins() {
        let store = test_store();
        store.put_value("role", "node-a", "master").unwrap();
        store.put_value("role", "node-a", "worker").unwrap();

        assert_eq!(store.get_value("role", "node-a").unwrap().as_deref(), Some("worker"));
    }

    #[test]
    fn entry_records_write_time() {
        let store = test_store();
        store.put_value("ip", "node-a", "10.0.0.9").unwrap();

        let entry = store.get_entry("ip", "node-a").unwrap().unwrap();
        assert_eq!(entry.value, "10.0.0.9");
        assert!(entry.updated_at > 0);
    }

    #[test]
    fn namespaces_are_isolated() {
        let store = test_store();
        store.put_value("role", "node-a", "worker").unwrap();
        store.put_value("ip", "node-a", "10.0.0.9").unwrap();
        store.put_value("roles", "node-b", "master").unwrap();

        let roles = store.list_namespace("role").unwrap();
        assert_eq!(roles, vec![("node-a".to_string(), "worker".to_string())]);
    }

    #[test]
    fn delete_entry() {
        let store = test_store();
        store.put_value("cluster", "node-token", "tok").unwrap();

        assert!(store.delete("cluster", "node-token").unwrap());
        assert!(!store.delete("cluster", "node-token").unwrap());
        assert!(store.get_value("cluster", "node-token").unwrap().is_none());
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let store = test_store();
        assert!(matches!(
            store.put_value("", "k", "v"),
            Err(StateError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.put_value("a/b", "k", "v"),
            Err(StateError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.get_value("role", ""),
            Err(StateError::InvalidKey { .. })
        ));
    }

    #[test]
    fn coordination_store_maps_errors() {
        let store = test_store();
        let err = CoordinationStore::set(&store, "", "k", "v").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));

        CoordinationStore::set(&store, "cluster", "leader-address", "10.0.0.1").unwrap();
        assert_eq!(
            CoordinationStore::get(&store, "cluster", "leader-address").unwrap(),
            Some("10.0.0.1".to_string())
        );
    }

    #[test]
    fn open_on_directory_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            StateStore::open(dir.path()),
            Err(StateError::Open(_))
        ));
    }

    #[test]
    fn corrupt_entry_is_deserialize_error() {
        let store = test_store();
        let txn = store.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(ENTRIES).unwrap();
            table.insert("cluster/leader-address", b"not json".as_slice()).unwrap();
        }
        txn.commit().unwrap();

        assert!(matches!(
            store.get_value("cluster", "leader-address"),
            Err(StateError::Deserialize(_))
        ));
        assert!(matches!(
            store.list_namespace("cluster"),
            Err(StateError::Deserialize(_))
        ));
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        let value = store.get_value("cluster", "leader-address").unwrap();
        assert_eq!(value.as_deref(), Some("10.0.0.1"));
    }
}
