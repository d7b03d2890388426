//! Countdown decomposition for reset deadlines.

use chrono::{DateTime, Utc};

// ============================================================================
// Countdown
// ============================================================================

/// Time remaining until a deadline, broken into display components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    /// Whole hours remaining.
    pub hours: i64,
    /// Minutes remaining within the hour.
    pub minutes: i64,
    /// Seconds remaining within the minute.
    pub seconds: i64,
    /// Total seconds remaining; non-positive once expired.
    pub total_seconds: i64,
}

impl Countdown {
    /// Computes the countdown from `now` to `target`.
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total_seconds = (target - now).num_seconds();
        let clamped = total_seconds.max(0);
        Self {
            hours: clamped / 3600,
            minutes: (clamped % 3600) / 60,
            seconds: clamped % 60,
            total_seconds,
        }
    }

    /// Returns true once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.total_seconds <= 0
    }

    /// Renders the countdown the way the dashboard shows it.
    pub fn human_readable(&self) -> String {
        if self.is_expired() {
            return "Expired".to_string();
        }
        if self.hours > 0 {
            format!("{}h {}m left", self.hours, self.minutes)
        } else if self.minutes > 0 {
            format!("{}m {}s left", self.minutes, self.seconds)
        } else {
            format!("{}s left", self.seconds)
        }
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.human_readable())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(offset: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now + offset, now)
    }

    #[test]
    fn test_components() {
        let (target, now) = at(Duration::seconds(2 * 3600 + 15 * 60 + 42));
        let countdown = Countdown::until(target, now);
        assert_eq!(countdown.hours, 2);
        assert_eq!(countdown.minutes, 15);
        assert_eq!(countdown.seconds, 42);
        assert!(!countdown.is_expired());
    }

    #[test]
    fn test_human_readable_hours() {
        let (target, now) = at(Duration::seconds(2 * 3600 + 15 * 60));
        assert_eq!(Countdown::until(target, now).human_readable(), "2h 15m left");
    }

    #[test]
    fn test_human_readable_minutes() {
        let (target, now) = at(Duration::seconds(5 * 60 + 30));
        assert_eq!(Countdown::until(target, now).human_readable(), "5m 30s left");
    }

    #[test]
    fn test_human_readable_seconds() {
        let (target, now) = at(Duration::seconds(45));
        assert_eq!(Countdown::until(target, now).human_readable(), "45s left");
    }

    #[test]
    fn test_expired() {
        let (target, now) = at(Duration::seconds(0));
        let countdown = Countdown::until(target, now);
        assert!(countdown.is_expired());
        assert_eq!(countdown.human_readable(), "Expired");

        let (target, now) = at(Duration::seconds(-90));
        let past = Countdown::until(target, now);
        assert!(past.is_expired());
        assert_eq!(past.human_readable(), "Expired");
        // Components never go negative, the raw total keeps the sign.
        assert_eq!(past.seconds, 0);
        assert_eq!(past.total_seconds, -90);
    }
}
