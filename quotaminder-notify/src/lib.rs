// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotaminder Notify
//!
//! Notification delivery channels for Quotaminder.
//!
//! This crate supplies the [`Notifier`](quotaminder_core::Notifier)
//! implementations the polling core can deliver through:
//!
//! - [`SystemNotifier`]: the host's native desktop notifications
//!   (`osascript` on macOS, `notify-send` elsewhere)
//! - [`BellNotifier`]: the terminal bell, for hosts without a desktop
//! - [`CommandNotifier`]: a user-supplied shell command template
//! - [`FallbackNotifier`]: primary channel with a fallback on failure
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use quotaminder_notify::{BellNotifier, FallbackNotifier, SystemNotifier};
//!
//! let notifier = FallbackNotifier::new(
//!     Arc::new(SystemNotifier::new()),
//!     Arc::new(BellNotifier::new()),
//! );
//! notifier.send("Quota Reset", "Your usage quota has reset.").await?;
//! ```

pub mod bell;
pub mod command;
pub mod error;
mod exec;
pub mod fallback;
pub mod system;

// Re-export key types
pub use bell::BellNotifier;
pub use command::{CommandNotifier, BODY_PLACEHOLDER, TITLE_PLACEHOLDER};
pub use error::NotifyError;
pub use fallback::FallbackNotifier;
pub use system::SystemNotifier;
