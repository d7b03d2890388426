// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotaminder Poll
//!
//! The resilience core of Quotaminder: polling, retry, and reminder
//! scheduling over any [`quotaminder_core::UsageSource`].
//!
//! ## Building blocks
//!
//! - [`backoff::BackoffPolicy`] - Exponential delay curves per failure
//!   class
//! - [`retry::RetryExecutor`] - Retries exactly one failure class,
//!   propagating everything else immediately
//! - [`throttle::NotificationThrottle`] - One notification per rolling
//!   window, across all categories
//! - [`reminder::ReminderScheduler`] - Once-per-cycle minutes-before
//!   and on-reset reminders against a moving deadline
//! - [`suppress::FocusGate`] - Quiet hours and high-usage
//!   do-not-disturb for reminder delivery
//!
//! ## The poller
//!
//! [`poller::UsagePoller`] ties the pieces into one background task
//! driven through a [`poller::PollerHandle`]:
//!
//! ```ignore
//! use quotaminder_poll::{PollerConfig, UsagePoller};
//!
//! let config = PollerConfig::default();
//! let handle = UsagePoller::new(config, source)
//!     .with_notifier(notifier)
//!     .spawn();
//!
//! let mut states = handle.state();
//! while states.changed().await.is_ok() {
//!     println!("{}", states.borrow().label());
//! }
//! ```

// Core modules
pub mod backoff;
pub mod config;
pub mod error;
pub mod poller;
pub mod reminder;
pub mod retry;
pub mod suppress;
pub mod throttle;

// Re-export key types at crate root

// Errors
pub use error::PollError;

// Policies & scheduling
pub use backoff::BackoffPolicy;
pub use reminder::{ReminderFire, ReminderScheduler, DEFAULT_THRESHOLDS};
pub use retry::RetryExecutor;
pub use suppress::{FocusGate, QuietHours, SuppressionReason, DEFAULT_DND_PERCENT};
pub use throttle::NotificationThrottle;

// Poller
pub use config::{
    PollerConfig, DEFAULT_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS,
};
pub use poller::{poll_once, PollerHandle, UsagePoller, CRITICAL_USAGE_PERCENT, HIGH_USAGE_PERCENT};
