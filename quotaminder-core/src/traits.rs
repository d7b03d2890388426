//! Trait definitions for Quotaminder.
//!
//! This module defines the collaborator boundaries of the polling core.
//! Real and no-op/mock implementations are supplied at construction
//! time; the core never inspects which kind it was given.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{Failure, UsageSnapshot};

/// An asynchronous source of usage snapshots.
///
/// Implementors are responsible for:
/// - Authenticating with the usage API
/// - Performing one fetch per call
/// - Mapping transport faults into structured [`Failure`] values,
///   including the `token_expired` / `rate_limited` / `offline` flags
///   when the transport gives a definite signal
///
/// The polling core treats this as black-box I/O.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Stable identifier for logging.
    fn id(&self) -> &str;

    /// Fetches the current usage snapshot.
    async fn fetch_usage(&self) -> Result<UsageSnapshot, Failure>;

    /// Fetches the current usage snapshot, skipping any short-lived
    /// response cache the source keeps. Manual refresh goes through
    /// this path. Defaults to a plain fetch.
    async fn fetch_usage_uncached(&self) -> Result<UsageSnapshot, Failure> {
        self.fetch_usage().await
    }
}

/// Delivers user-facing notifications.
///
/// Delivery failures stay at this boundary: callers log and swallow
/// them, so an erroring notifier must never influence poll outcomes.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable identifier for logging.
    fn id(&self) -> &str;

    /// Returns true if this notifier can deliver on the current host.
    fn is_available(&self) -> bool {
        true
    }

    /// Delivers a notification with the given title and body.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Notification`] when delivery fails.
    async fn send(&self, title: &str, body: &str) -> Result<(), CoreError>;
}
