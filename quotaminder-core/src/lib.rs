// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotaminder Core
//!
//! Core types, models, and traits for the Quotaminder application.
//!
//! This crate provides the foundational abstractions used across all
//! other Quotaminder crates, including:
//!
//! - Domain models (usage snapshots, failures, derived poll state)
//! - Error types
//! - Trait definitions for the usage-source and notifier boundaries
//! - Countdown rendering for reset deadlines
//!
//! ## Key Types
//!
//! ### Usage Types
//! - [`UsageSnapshot`] - Result of one successful poll
//! - [`PollState`] - The poller's externally visible state
//!
//! ### Failure Types
//! - [`Failure`] - Structured failure value from a source
//! - [`FailureKind`] - Classification driving retry policy
//!
//! ### Goals & Display
//! - [`PaceGoal`] / [`PaceStatus`] - Daily budget pace tracking
//! - [`Countdown`] - Reset deadline decomposition

pub mod countdown;
pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{Failure, FailureKind, PaceGoal, PaceStatus, PollState, UsageSnapshot};

// Re-export display helpers
pub use countdown::Countdown;

// Re-export traits
pub use traits::{Notifier, UsageSource};
