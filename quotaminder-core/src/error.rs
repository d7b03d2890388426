//! Core error types for Quotaminder.

use thiserror::Error;

/// Core error type for Quotaminder operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from a usage source.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Notification could not be delivered.
    #[error("Notification delivery failed: {0}")]
    Notification(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
