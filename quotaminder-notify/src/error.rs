//! Notification error types.

use std::time::Duration;
use thiserror::Error;

use quotaminder_core::CoreError;

/// Error type for notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No delivery command available on this host.
    #[error("Notification command not found: {0}")]
    NoCommand(String),

    /// Delivery command timed out.
    #[error("Notification command timed out after {0:?}")]
    Timeout(Duration),

    /// Delivery command exited non-zero.
    #[error("Notification command exited with code {code}: {stderr}")]
    NonZeroExit {
        /// Exit code from the process.
        code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NotifyError> for CoreError {
    fn from(err: NotifyError) -> Self {
        CoreError::Notification(err.to_string())
    }
}
