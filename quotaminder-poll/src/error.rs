//! Error types for the polling crate.

use thiserror::Error;

/// Errors surfaced through the poller handle.
#[derive(Error, Debug)]
pub enum PollError {
    /// The poller task has stopped and can no longer accept commands.
    #[error("Poller is not running")]
    NotRunning,
}
