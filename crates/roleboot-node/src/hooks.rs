//! Hooks executed through an external stage runner.

use roleboot_core::{HookError, HookRunner};
use tracing::debug;

use crate::exec::{self, Exit};

/// Runs hooks as `<program> run-stage <prefix>.<hook>`.
#[derive(Debug, Clone)]
pub struct CommandHookRunner {
    program: String,
    stage_prefix: String,
}

impl CommandHookRunner {
    pub fn new(program: impl Into<String>, stage_prefix: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            stage_prefix: stage_prefix.into(),
        }
    }

    pub fn stage(&self, hook: &str) -> String {
        format!("{}.{hook}", self.stage_prefix)
    }
}

impl HookRunner for CommandHookRunner {
    fn run(&self, hook: &str) -> Result<(), HookError> {
        let stage = self.stage(hook);
        debug!(program = %self.program, %stage, "running hook");
        match exec::run(&self.program, &["run-stage", &stage]) {
            Ok(Exit::Success) => Ok(()),
            Ok(Exit::Failed(status)) => Err(HookError::Status { hook: stage, status }),
            Err(source) => Err(HookError::Spawn { hook: stage, source }),
        }
    }
}
