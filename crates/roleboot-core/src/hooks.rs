//! External hook contract.

use crate::error::HookError;

/// Runs named extension hooks. Failures are observed, never escalated.
pub trait HookRunner: Send + Sync {
    fn run(&self, hook: &str) -> Result<(), HookError>;
}

/// Hook runner that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl HookRunner for NoopHooks {
    fn run(&self, _hook: &str) -> Result<(), HookError> {
        Ok(())
    }
}
