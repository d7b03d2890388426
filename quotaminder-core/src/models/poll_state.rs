//! Derived poll state.
//!
//! [`PollState`] is the single value the poller publishes to its
//! consumers. Exactly one variant holds at any time; transitions are
//! driven only by poll outcomes.

use serde::{Deserialize, Serialize};

use super::usage::UsageSnapshot;

// ============================================================================
// Poll State
// ============================================================================

/// The poller's externally visible state.
///
/// `Offline` and `RateLimited` are mutually exclusive and both mean no
/// fresh snapshot is available. Consumers that want to keep rendering
/// the last good snapshot during degraded periods retain it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollState {
    /// A poll is in flight; nothing has settled yet this cycle.
    Loading,
    /// The last poll succeeded.
    Ready(UsageSnapshot),
    /// Connectivity is down; retries were exhausted.
    Offline,
    /// The server is throttling us; retries were exhausted.
    RateLimited,
    /// A terminal, non-retryable error.
    Errored(String),
}

impl PollState {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Ready(_) => "Ready",
            Self::Offline => "Offline",
            Self::RateLimited => "Rate Limited",
            Self::Errored(_) => "Error",
        }
    }

    /// Returns a one-character status symbol for terminal rendering.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Loading => "…",
            Self::Ready(_) => "●",
            Self::Offline => "✗",
            Self::RateLimited => "⏳",
            Self::Errored(_) => "!",
        }
    }

    /// Returns true once a successful poll has produced a snapshot.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns true for degraded states with no fresh snapshot.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Offline | Self::RateLimited | Self::Errored(_))
    }

    /// Returns the snapshot carried by `Ready`, if any.
    pub fn snapshot(&self) -> Option<&UsageSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::Loading
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Errored(message) => write!(f, "{}: {}", self.label(), message),
            _ => write!(f, "{}", self.label()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
