//! Poller configuration.

use std::time::Duration;

use tracing::warn;

use crate::reminder::DEFAULT_THRESHOLDS;
use crate::suppress::FocusGate;

/// Smallest accepted poll interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;
/// Largest accepted poll interval.
pub const MAX_POLL_INTERVAL_SECS: u64 = 300;
/// Poll interval used when nothing is configured.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
/// Fixed cadence of the reminder evaluation timer.
pub const REMINDER_TICK_SECS: u64 = 30;

/// Runtime configuration for the poller task.
///
/// Values arrive already parsed; the poller is lenient and fixes what
/// it can via [`PollerConfig::sanitize`] instead of refusing to start.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between scheduled polls.
    pub poll_interval: Duration,
    /// Minutes-before-reset reminder thresholds.
    pub reminder_thresholds: Vec<u32>,
    /// Suppression rules for reminder notifications.
    pub focus: FocusGate,
}

impl PollerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the reminder thresholds.
    pub fn with_reminder_thresholds(mut self, thresholds: Vec<u32>) -> Self {
        self.reminder_thresholds = thresholds;
        self
    }

    /// Sets the reminder suppression rules.
    pub fn with_focus_gate(mut self, focus: FocusGate) -> Self {
        self.focus = focus;
        self
    }

    /// Fixes out-of-range values in place.
    ///
    /// - Clamps the poll interval into the accepted range
    /// - Drops duplicate and zero reminder thresholds
    pub fn sanitize(&mut self) {
        self.poll_interval = clamp_poll_interval(self.poll_interval);

        let mut seen = std::collections::HashSet::new();
        self.reminder_thresholds.retain(|&minutes| {
            if minutes == 0 {
                warn!("Ignoring zero-minute reminder threshold");
                return false;
            }
            seen.insert(minutes)
        });
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            reminder_thresholds: DEFAULT_THRESHOLDS.to_vec(),
            focus: FocusGate::default(),
        }
    }
}

/// Clamps a requested poll interval into the accepted range, warning
/// when the request was out of range.
pub(crate) fn clamp_poll_interval(requested: Duration) -> Duration {
    let min = Duration::from_secs(MIN_POLL_INTERVAL_SECS);
    let max = Duration::from_secs(MAX_POLL_INTERVAL_SECS);
    if requested < min {
        warn!(
            requested_secs = requested.as_secs(),
            clamped_secs = MIN_POLL_INTERVAL_SECS,
            "Poll interval below minimum, clamping"
        );
        min
    } else if requested > max {
        warn!(
            requested_secs = requested.as_secs(),
            clamped_secs = MAX_POLL_INTERVAL_SECS,
            "Poll interval above maximum, clamping"
        );
        max
    } else {
        requested
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.reminder_thresholds, vec![30, 15, 5]);
    }

    #[test]
    fn test_sanitize_clamps_interval_low() {
        let mut config = PollerConfig::new().with_poll_interval(Duration::from_secs(5));
        config.sanitize();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_sanitize_clamps_interval_high() {
        let mut config = PollerConfig::new().with_poll_interval(Duration::from_secs(3600));
        config.sanitize();
        assert_eq!(config.poll_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_sanitize_keeps_in_range_interval() {
        let mut config = PollerConfig::new().with_poll_interval(Duration::from_secs(120));
        config.sanitize();
        assert_eq!(config.poll_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_sanitize_dedups_thresholds() {
        let mut config = PollerConfig::new().with_reminder_thresholds(vec![30, 15, 30, 0, 5]);
        config.sanitize();
        assert_eq!(config.reminder_thresholds, vec![30, 15, 5]);
    }
}
