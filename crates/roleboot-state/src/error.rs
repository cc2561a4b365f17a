//! Error types for the roleboot state store.

use roleboot_core::StoreError;
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("invalid key {namespace}/{key}")]
    InvalidKey { namespace: String, key: String },
}

impl From<StateError> for StoreError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::InvalidKey { namespace, key } => StoreError::InvalidKey { namespace, key },
            StateError::Open(msg) => StoreError::Unavailable(msg),
            StateError::Write(msg) | StateError::Serialize(msg) => StoreError::Write(msg),
            other => StoreError::Read(other.to_string()),
        }
    }
}
