// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotaminder Source
//!
//! Usage API clients for Quotaminder.
//!
//! This crate supplies the [`UsageSource`](quotaminder_core::UsageSource)
//! implementations the polling core consumes:
//!
//! - [`HttpUsageSource`]: the production client for the OAuth usage API,
//!   with transport-fault mapping and a short-lived response cache
//! - [`StaticSource`]: a fixed-answer source for demos and offline wiring
//!
//! ## Usage
//!
//! ```ignore
//! use quotaminder_source::HttpUsageSource;
//!
//! let source = HttpUsageSource::new(token);
//! let snapshot = source.fetch_usage().await?;
//! println!("{:.1}% used", snapshot.utilization_percent);
//! ```

pub mod http;
pub mod map;
pub mod static_source;

// Re-export key types
pub use http::{ApiWindow, HttpUsageSource, UsageApiResponse, DEFAULT_BASE_URL, USAGE_ENDPOINT};
pub use map::{failure_from_status, failure_from_transport, is_auth_message, AUTH_PATTERNS};
pub use static_source::StaticSource;
