//! Backoff policies for retry delays.

use std::time::Duration;

/// Base delay for the network (connectivity) backoff curve.
const NETWORK_BASE_DELAY_MS: u64 = 2_000;
/// Cap for the network backoff curve.
const NETWORK_CAP_MS: u64 = 32_000;
/// Base delay for the rate-limit backoff curve.
const RATE_LIMIT_BASE_DELAY_MS: u64 = 1_000;
/// Cap for the rate-limit backoff curve. The observed behavior was
/// uncapped; a 30 s ceiling bounds the doubling series.
const RATE_LIMIT_CAP_MS: u64 = 30_000;

/// Pure mapping from retry attempt to delay.
///
/// `delay_for(attempt)` is `min(base * 2^attempt, cap)`, 0-indexed at
/// the first retry: attempt 0 is the delay before the second overall
/// try.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any delay, in milliseconds.
    pub cap_ms: u64,
}

impl BackoffPolicy {
    /// Creates a policy with the given base delay and cap.
    pub fn new(base_delay_ms: u64, cap_ms: u64) -> Self {
        Self {
            base_delay_ms,
            cap_ms,
        }
    }

    /// The backoff curve for connectivity failures: 2s doubling to a
    /// 32s ceiling.
    pub fn network() -> Self {
        Self::new(NETWORK_BASE_DELAY_MS, NETWORK_CAP_MS)
    }

    /// The backoff curve for server backpressure: 1s doubling to a 30s
    /// ceiling.
    pub fn rate_limit() -> Self {
        Self::new(RATE_LIMIT_BASE_DELAY_MS, RATE_LIMIT_CAP_MS)
    }

    /// Calculates the delay before retry number `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.cap_ms))
    }
}
