//! Shared subprocess plumbing for command-backed notifiers.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::warn;

use crate::error::NotifyError;

/// How long a delivery command may run before it is abandoned.
pub(crate) const COMMAND_TIMEOUT_SECS: u64 = 10;

/// Runs a delivery command to completion, enforcing the timeout and a
/// zero exit status. Stdout is discarded; stderr is kept for the error.
pub(crate) async fn run_delivery(command: &mut Command) -> Result<(), NotifyError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let timeout = Duration::from_secs(COMMAND_TIMEOUT_SECS);
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(timeout = ?timeout, "Notification command timed out");
            return Err(NotifyError::Timeout(timeout));
        }
    };

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        warn!(code, stderr = %stderr, "Notification command failed");
        return Err(NotifyError::NonZeroExit { code, stderr });
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
