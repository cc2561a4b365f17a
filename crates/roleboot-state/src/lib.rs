//! roleboot-state — local replica of the coordination store.
//!
//! Backed by [redb](https://docs.rs/redb). Entries live in a single table
//! keyed `{namespace}/{key}` and hold a JSON-serialized [`StoreEntry`].
//! Whatever replicates the cluster's shared state writes into this database;
//! the bootstrap core reads and writes it through `CoordinationStore`.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::StoreEntry;
