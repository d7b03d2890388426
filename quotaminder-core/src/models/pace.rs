//! Daily budget pace tracking.
//!
//! An optional feature: the user declares how much of the quota they
//! intend to spend per day, and each successful poll is assessed
//! against an even 24-hour distribution of that budget.

use chrono::{Local, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Fraction of headroom allowed before a pace is called exceeded.
const PACE_TOLERANCE: f64 = 1.1;

// ============================================================================
// Pace Goal
// ============================================================================

/// A daily usage budget, as a percentage of the quota.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceGoal {
    /// How much of the quota the user plans to spend per day (0-100).
    pub daily_budget_percent: f64,
}

impl PaceGoal {
    /// Creates a goal with the given daily budget.
    pub fn new(daily_budget_percent: f64) -> Self {
        Self {
            daily_budget_percent,
        }
    }

    /// Assesses usage against the budget at a given hour of day.
    ///
    /// The expected value assumes even spending across 24 hours;
    /// `on_track` allows a 10% margin over it.
    pub fn assess_at(&self, hours_into_day: f64, current_percent: f64) -> PaceStatus {
        let expected_percent = (hours_into_day / 24.0) * self.daily_budget_percent;
        PaceStatus {
            on_track: current_percent <= expected_percent * PACE_TOLERANCE,
            current_percent,
            expected_percent,
        }
    }

    /// Assesses usage against the budget at the current local time.
    pub fn assess_now(&self, current_percent: f64) -> PaceStatus {
        let now = Local::now().time();
        self.assess_at(hours_since_midnight(now), current_percent)
    }
}

/// Hours elapsed since local midnight, fractional.
fn hours_since_midnight(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / 3600.0
}

// ============================================================================
// Pace Status
// ============================================================================

/// Result of a pace assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceStatus {
    /// True while usage stays within the expected value plus margin.
    pub on_track: bool,
    /// Usage at assessment time.
    pub current_percent: f64,
    /// Budget share expected to be spent by now.
    pub expected_percent: f64,
}

impl PaceStatus {
    /// Amount by which the expected pace is exceeded, zero when on track.
    pub fn overage_percent(&self) -> f64 {
        (self.current_percent - self.expected_percent).max(0.0)
    }
}

impl std::fmt::Display for PaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.on_track {
            write!(
                f,
                "On track: {:.1}% / {:.1}% expected",
                self.current_percent, self.expected_percent
            )
        } else {
            write!(f, "Pace exceeded by {:.1}%", self.overage_percent())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
