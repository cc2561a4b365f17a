//! Error types for the bootstrap core and its collaborators.

use thiserror::Error;

/// Result type alias for coordination store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for descriptor operations.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Errors surfaced by a coordination store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid key {namespace}/{key}")]
    InvalidKey { namespace: String, key: String },

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),
}

/// Errors raised by a platform descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("no supported distribution detected")]
    UnsupportedPlatform,

    #[error("orchestration context not attached")]
    MissingContext,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Other(String),
}

/// Errors raised by a service-management handle.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {status}")]
    Status { command: String, status: i32 },

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while running an external hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to spawn hook `{hook}`: {source}")]
    Spawn {
        hook: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hook `{hook}` exited with status {status}")]
    Status { hook: String, status: i32 },
}

/// Errors raised by the sentinel gate.
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("failed to create sentinel at {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// How far a failure should propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Logged and swallowed; never fails an attempt.
    Advisory,
    /// Fails the attempt; a later attempt may succeed.
    Transient,
    /// Fails the attempt; will not self-heal without operator action.
    Fatal,
}

/// A failed bootstrap attempt.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to declare role: {0}")]
    RoleDeclaration(#[source] StoreError),

    #[error("failed to read {namespace}/{key}: {source}")]
    StoreRead {
        namespace: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to determine platform: {0}")]
    PlatformDetection(#[source] DescriptorError),

    #[error("worker setup failed: {0}")]
    WorkerSetup(#[source] DescriptorError),

    #[error("no {platform} binary found")]
    MissingBinary { platform: String },

    #[error("failed to compute worker args: {0}")]
    WorkerArgs(#[source] DescriptorError),

    #[error("failed to acquire service handle: {0}")]
    ServiceHandle(#[source] DescriptorError),

    #[error("service {step} failed: {source}")]
    Service {
        step: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("failed to seal bootstrap: {0}")]
    Sentinel(#[from] SentinelError),
}

impl BootstrapError {
    /// Severity of this failure.
    pub fn severity(&self) -> Severity {
        match self {
            Self::PlatformDetection(_) | Self::MissingBinary { .. } | Self::Sentinel(_) => {
                Severity::Fatal
            }
            _ => Severity::Transient,
        }
    }

    /// Whether retrying can succeed without operator action.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
