//! Global notification throttling.

use std::time::{Duration, Instant};

/// Minimum interval between notifications (1 minute).
pub const NOTIFICATION_THROTTLE: Duration = Duration::from_secs(60);

/// Gate enforcing a minimum interval between outbound notifications.
///
/// One gate covers every category: usage warnings, reset reminders, and
/// failure alerts all share the same rolling window. A suppressed
/// notification is silently dropped, never queued or retried. The gate
/// is an owned instance, constructed and injected explicitly.
#[derive(Debug, Clone)]
pub struct NotificationThrottle {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl NotificationThrottle {
    /// Creates a throttle with the standard 60-second window.
    pub fn new() -> Self {
        Self::with_interval(NOTIFICATION_THROTTLE)
    }

    /// Creates a throttle with a custom window.
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    /// Returns true if a notification may be sent at `now`.
    pub fn can_send(&self, now: Instant) -> bool {
        self.last_sent
            .is_none_or(|last| now.duration_since(last) >= self.min_interval)
    }

    /// Records a successful delivery at `now`.
    ///
    /// Callers record only after delivery succeeds, so a failed send
    /// does not burn the window.
    pub fn record_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}

impl Default for NotificationThrottle {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
