//! Blocking command execution for service and hook programs.

use std::process::Command;

use tracing::debug;

/// Outcome of a finished command.
pub(crate) enum Exit {
    Success,
    Failed(i32),
}

/// Run `program args...` to completion, capturing output.
pub(crate) fn run(program: &str, args: &[&str]) -> std::io::Result<Exit> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    debug!("Running: {:?}", cmd);

    let output = cmd.output()?;
    if output.status.success() {
        Ok(Exit::Success)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(%program, stderr = %stderr.trim(), "command failed");
        Ok(Exit::Failed(output.status.code().unwrap_or(-1)))
    }
}
