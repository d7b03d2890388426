//! Reminder suppression rules.
//!
//! The gate sits between the reminder scheduler and the notifier and
//! drops reminder-category notifications during quiet hours or while a
//! high-usage do-not-disturb rule is in force. Usage warnings and
//! failure alerts bypass it entirely.

use serde::{Deserialize, Serialize};

/// Do-not-disturb percentage applied when enabled without a value.
pub const DEFAULT_DND_PERCENT: f64 = 80.0;

// ============================================================================
// Quiet Hours
// ============================================================================

/// A daily local-time window during which reminders stay silent.
///
/// Hours are 0-23. When `start_hour > end_hour` the window wraps
/// midnight (22 to 7 covers 23:00 and 06:00 but not 12:00). Equal
/// hours describe an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// First quiet hour, inclusive.
    pub start_hour: u32,
    /// First hour past the window, exclusive.
    pub end_hour: u32,
}

impl QuietHours {
    /// Creates a window from inclusive start to exclusive end.
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Returns true if the given local hour falls inside the window.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

// ============================================================================
// Focus Gate
// ============================================================================

/// Why a reminder was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionReason {
    /// The local clock is inside the configured quiet hours.
    QuietHours,
    /// Utilization is above the do-not-disturb percentage.
    HighUsage,
}

impl std::fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuietHours => write!(f, "quiet hours"),
            Self::HighUsage => write!(f, "high-usage do-not-disturb"),
        }
    }
}

/// Decides whether reminder notifications may be delivered right now.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusGate {
    quiet_hours: Option<QuietHours>,
    dnd_above_percent: Option<f64>,
}

impl FocusGate {
    /// Creates a gate with no rules (everything passes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quiet-hours window.
    pub fn with_quiet_hours(mut self, quiet_hours: QuietHours) -> Self {
        self.quiet_hours = Some(quiet_hours);
        self
    }

    /// Suppresses reminders while utilization is above the given
    /// percentage.
    pub fn with_dnd_above(mut self, percent: f64) -> Self {
        self.dnd_above_percent = Some(percent);
        self
    }

    /// Returns the first rule suppressing reminders at this moment, or
    /// `None` when delivery is allowed.
    ///
    /// `local_hour` is the local wall-clock hour; `usage_percent` is
    /// the latest known utilization, if any.
    pub fn suppression_reason(
        &self,
        local_hour: u32,
        usage_percent: Option<f64>,
    ) -> Option<SuppressionReason> {
        if let Some(window) = &self.quiet_hours {
            if window.contains(local_hour) {
                return Some(SuppressionReason::QuietHours);
            }
        }
        if let (Some(limit), Some(usage)) = (self.dnd_above_percent, usage_percent) {
            if usage > limit {
                return Some(SuppressionReason::HighUsage);
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
