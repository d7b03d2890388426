//! Domain models for Quotaminder.
//!
//! This module contains the data structures that flow between the
//! poller, its collaborators, and the presentation surfaces.
//!
//! ## Submodules
//!
//! - [`usage`] - Poll results (`UsageSnapshot`)
//! - [`failure`] - Failure representation and classification
//! - [`poll_state`] - The poller's derived state machine value
//! - [`pace`] - Daily budget pace tracking

mod failure;
mod pace;
mod poll_state;
mod usage;

// Re-export everything at the models level
pub use failure::{Failure, FailureKind};
pub use pace::{PaceGoal, PaceStatus};
pub use poll_state::PollState;
pub use usage::UsageSnapshot;
