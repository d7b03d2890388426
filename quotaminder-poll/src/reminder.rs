//! Reset reminder scheduling.
//!
//! The scheduler watches the moving reset deadline and decides, on each
//! tick, whether a minutes-before threshold was just crossed or the
//! deadline itself just passed. Threshold memory is scoped to one reset
//! cycle and re-arms when a different deadline shows up.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Default minutes-before-reset thresholds.
pub const DEFAULT_THRESHOLDS: [u32; 3] = [30, 15, 5];

// ============================================================================
// Reminder Fire
// ============================================================================

/// What one reminder tick decided to fire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFire {
    /// Threshold minutes newly crossed this tick. The floored
    /// remaining-minutes value matches at most one threshold, so a
    /// tick fires at most one.
    pub threshold: Option<u32>,
    /// True when the deadline passed and on-reset had not fired yet
    /// this cycle.
    pub on_reset: bool,
    /// Remaining whole minutes at evaluation time (floored; negative
    /// once the deadline is behind us). Zero when evaluation was
    /// skipped by a snooze.
    pub remaining_minutes: i64,
}

impl ReminderFire {
    /// Returns true if nothing fired.
    pub fn is_quiet(&self) -> bool {
        self.threshold.is_none() && !self.on_reset
    }
}

// ============================================================================
// Reminder Scheduler
// ============================================================================

/// Tracks which reminders have fired for the current reset cycle.
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    thresholds: Vec<u32>,
    fired: HashSet<u32>,
    on_reset_fired: bool,
    last_resets_at: Option<DateTime<Utc>>,
}

impl ReminderScheduler {
    /// Creates a scheduler with the given minutes-before thresholds.
    pub fn new(thresholds: Vec<u32>) -> Self {
        Self {
            thresholds,
            fired: HashSet::new(),
            on_reset_fired: false,
            last_resets_at: None,
        }
    }

    /// Replaces the configured thresholds.
    ///
    /// Memory is kept: thresholds already fired this cycle stay fired.
    pub fn set_thresholds(&mut self, thresholds: Vec<u32>) {
        self.thresholds = thresholds;
    }

    /// Returns the configured thresholds.
    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    /// Evaluates one tick against the deadline.
    ///
    /// A threshold `m` fires when the floored remaining minutes sit in
    /// `(m-1, m]`, at most once per cycle. Once the deadline passes,
    /// `on_reset` is reported exactly once and the threshold memory
    /// clears, ready for the next observed deadline.
    pub fn on_tick(
        &mut self,
        now: DateTime<Utc>,
        resets_at: DateTime<Utc>,
        snooze_until: Option<DateTime<Utc>>,
    ) -> ReminderFire {
        // A different deadline means a new cycle: re-arm everything.
        if self.last_resets_at != Some(resets_at) {
            if self.last_resets_at.is_some() {
                debug!(resets_at = %resets_at, "Reset deadline changed, re-arming reminders");
            }
            self.fired.clear();
            self.on_reset_fired = false;
            self.last_resets_at = Some(resets_at);
        }

        // Snoozed ticks fire nothing and consume nothing, so a
        // threshold still in range when the snooze lifts fires then.
        if let Some(until) = snooze_until {
            if now < until {
                return ReminderFire::default();
            }
        }

        let remaining = remaining_minutes(now, resets_at);
        let mut fire = ReminderFire {
            remaining_minutes: remaining,
            ..ReminderFire::default()
        };

        for &threshold in &self.thresholds {
            if self.fired.contains(&threshold) {
                continue;
            }
            let m = i64::from(threshold);
            if remaining <= m && remaining > m - 1 {
                self.fired.insert(threshold);
                fire.threshold = Some(threshold);
                break;
            }
        }

        if remaining <= 0 && !self.on_reset_fired {
            self.on_reset_fired = true;
            self.fired.clear();
            fire.on_reset = true;
        }

        fire
    }
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLDS.to_vec())
    }
}

/// Whole minutes from `now` until `resets_at`, floored (also for
/// negative remainders: 90 seconds past the deadline reads -2).
fn remaining_minutes(now: DateTime<Utc>, resets_at: DateTime<Utc>) -> i64 {
    (resets_at - now).num_milliseconds().div_euclid(60_000)
}

// ============================================================================
// Tests
// ============================================================================
