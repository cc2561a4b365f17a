//! Sentinel gate — durable "already bootstrapped" marker.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SentinelError;

/// Local idempotency marker for the bootstrap sequence.
pub trait SentinelGate: Send + Sync {
    fn exists(&self) -> bool;
    fn create(&self) -> Result<(), SentinelError>;
}

/// Sentinel backed by a marker file.
#[derive(Debug, Clone)]
pub struct FileSentinel {
    path: PathBuf,
}

impl FileSentinel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SentinelGate for FileSentinel {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn create(&self) -> Result<(), SentinelError> {
        let err = |source| SentinelError::Create {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(err)?;
        }
        std::fs::write(&self.path, b"").map_err(err)?;
        debug!(path = ?self.path, "sentinel created");
        Ok(())
    }
}
