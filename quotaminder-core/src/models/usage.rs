//! Usage-related types.
//!
//! This module contains the result type of a successful poll:
//! - [`UsageSnapshot`] - quota utilization plus the reset deadline

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Usage Snapshot
// ============================================================================

/// A snapshot of quota usage from one successful poll.
///
/// `utilization_percent` is 0-100 by the source contract. Out-of-range
/// values are passed through untouched; display layers that want clamped
/// values call [`UsageSnapshot::sanitize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Percentage of quota used (0-100 per the source contract).
    pub utilization_percent: f64,
    /// When the current usage window resets. May move forward between
    /// polls when a new window opens early.
    pub resets_at: Option<DateTime<Utc>>,
    /// Window duration in minutes (300 = 5 hours).
    pub window_minutes: Option<u32>,
    /// Tokens consumed in the current window, when the API reports them.
    pub tokens_used: Option<u64>,
    /// Token ceiling for the current window, when the API reports it.
    pub tokens_limit: Option<u64>,
    /// When this snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Creates a new snapshot with the given utilization percentage.
    pub fn new(utilization_percent: f64) -> Self {
        Self {
            utilization_percent,
            resets_at: None,
            window_minutes: None,
            tokens_used: None,
            tokens_limit: None,
            fetched_at: Utc::now(),
        }
    }

    /// Returns the remaining percentage (100 - used).
    pub fn remaining_percent(&self) -> f64 {
        (100.0 - self.utilization_percent).max(0.0)
    }

    /// Returns true if usage has reached the limit.
    pub fn is_over_limit(&self) -> bool {
        self.utilization_percent >= 100.0
    }

    /// Returns true if this snapshot is older than the threshold.
    pub fn is_stale(&self, threshold: Duration) -> bool {
        Utc::now() - self.fetched_at > threshold
    }

    /// Returns time until the window resets, if the deadline is known.
    ///
    /// Negative when the deadline has already passed.
    pub fn time_until_reset(&self) -> Option<Duration> {
        self.resets_at.map(|reset| reset - Utc::now())
    }

    /// Returns remaining tokens when both counters are known.
    pub fn tokens_remaining(&self) -> Option<u64> {
        match (self.tokens_used, self.tokens_limit) {
            (Some(used), Some(limit)) => Some(limit.saturating_sub(used)),
            _ => None,
        }
    }
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl UsageSnapshot {
    /// Validates the snapshot data.
    ///
    /// Only non-finite percentages are rejected here; values outside
    /// [0, 100] are the source's contract to uphold and pass through so
    /// callers can observe what the API actually returned.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if `utilization_percent` is NaN
    /// or infinite.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.utilization_percent.is_finite() {
            return Err(CoreError::InvalidData(
                "utilization_percent is not a finite number".to_string(),
            ));
        }
        Ok(())
    }

    /// Sanitizes snapshot data by clamping to displayable ranges.
    ///
    /// - Replaces NaN/Infinity with 0.0
    /// - Clamps `utilization_percent` to [0, 100]
    pub fn sanitize(&mut self) {
        if !self.utilization_percent.is_finite() {
            self.utilization_percent = 0.0;
        }
        self.utilization_percent = self.utilization_percent.clamp(0.0, 100.0);
    }
}

// ============================================================================
// Tests
// ============================================================================
