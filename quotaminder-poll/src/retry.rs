//! Class-matched retry execution.
//!
//! A [`RetryExecutor`] wraps an async operation and retries exactly one
//! [`FailureKind`] with exponential backoff. The poller stacks two of
//! them: an inner executor for connectivity failures, an outer one for
//! server backpressure, so that backpressure retries re-invoke the
//! whole network-retry-wrapped call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use quotaminder_core::{Failure, FailureKind};
use tracing::debug;

use crate::backoff::BackoffPolicy;

/// Retry budget of the connectivity executor.
const NETWORK_MAX_ATTEMPTS: u32 = 5;
/// Retry budget of the backpressure executor.
const RATE_LIMIT_MAX_ATTEMPTS: u32 = 4;

/// Observer invoked before each retry sleep with `(attempt, delay)`.
/// Attempt numbers are 1-based.
pub type RetryObserver = Arc<dyn Fn(u32, Duration) + Send + Sync>;

/// Runs an operation, retrying one failure class with backoff.
///
/// Failures whose classification does not match `retry_on` propagate
/// immediately with zero delay. `max_attempts` counts retries, so an
/// executor permits `max_attempts + 1` tries in total.
#[derive(Clone)]
pub struct RetryExecutor {
    retry_on: FailureKind,
    policy: BackoffPolicy,
    max_attempts: u32,
    observer: Option<RetryObserver>,
}

impl RetryExecutor {
    /// Creates an executor retrying `retry_on` failures.
    pub fn new(retry_on: FailureKind, policy: BackoffPolicy, max_attempts: u32) -> Self {
        Self {
            retry_on,
            policy,
            max_attempts,
            observer: None,
        }
    }

    /// Stock executor for connectivity failures: 5 retries on the
    /// network curve.
    pub fn network() -> Self {
        Self::new(
            FailureKind::NetworkError,
            BackoffPolicy::network(),
            NETWORK_MAX_ATTEMPTS,
        )
    }

    /// Stock executor for server backpressure: 4 retries on the
    /// rate-limit curve.
    pub fn rate_limit() -> Self {
        Self::new(
            FailureKind::RateLimited,
            BackoffPolicy::rate_limit(),
            RATE_LIMIT_MAX_ATTEMPTS,
        )
    }

    /// Installs a retry observer.
    pub fn with_observer(mut self, observer: impl Fn(u32, Duration) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Returns the failure class this executor retries.
    pub fn retry_on(&self) -> FailureKind {
        self.retry_on
    }

    /// Runs the operation until it succeeds, fails with a different
    /// class, or exhausts the retry budget.
    ///
    /// # Errors
    ///
    /// Returns the last observed [`Failure`] once no retry applies.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, Failure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(failure) => {
                    if failure.classify() != self.retry_on || attempt >= self.max_attempts {
                        return Err(failure);
                    }

                    let delay = self.policy.delay_for(attempt);
                    debug!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "Retrying after failure"
                    );
                    if let Some(ref observer) = self.observer {
                        observer(attempt + 1, delay);
                    }

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn recording_observer(log: Arc<Mutex<Vec<(u32, u64)>>>) -> impl Fn(u32, Duration) + Send + Sync {
        move |attempt, delay| {
            log.lock()
                .unwrap()
                .push((attempt, delay.as_millis() as u64));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_budget_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let delays = Arc::new(Mutex::new(Vec::new()));
        let executor = RetryExecutor::network().with_observer(recording_observer(delays.clone()));

        let counter = calls.clone();
        let result: Result<(), Failure> = executor
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::offline("connection refused"))
                }
            })
            .await;

        assert!(result.is_err());
        // Initial try plus five retries.
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(
            *delays.lock().unwrap(),
            vec![
                (1, 2_000),
                (2, 4_000),
                (3, 8_000),
                (4, 16_000),
                (5, 32_000)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let delays = Arc::new(Mutex::new(Vec::new()));
        let executor =
            RetryExecutor::rate_limit().with_observer(recording_observer(delays.clone()));

        let counter = calls.clone();
        let result: Result<(), Failure> = executor
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::rate_limited("slow down"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            *delays.lock().unwrap(),
            vec![(1, 1_000), (2, 2_000), (3, 4_000), (4, 8_000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::network();

        let counter = calls.clone();
        let result = executor
            .run(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Failure::offline("flaky"))
                    } else {
                        Ok(99)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_matching_class_propagates_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::network();
        let start = tokio::time::Instant::now();

        let counter = calls.clone();
        let result: Result<(), Failure> = executor
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::token_expired("401"))
                }
            })
            .await;

        assert_eq!(result.unwrap_err().classify(), FailureKind::TokenExpired);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::network();
        let start = tokio::time::Instant::now();

        let counter = calls.clone();
        let result: Result<(), Failure> = executor
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::new("weird payload"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_executors() {
        // Backpressure retries re-invoke the network-wrapped operation
        // as a whole: rate-limited, then two connectivity failures, then
        // success.
        let calls = Arc::new(AtomicU32::new(0));
        let inner = RetryExecutor::network();
        let outer = RetryExecutor::rate_limit();
        let start = tokio::time::Instant::now();

        let counter = calls.clone();
        let result = outer
            .run(|| {
                let inner = inner.clone();
                let counter = counter.clone();
                async move {
                    inner
                        .run(|| {
                            let counter = counter.clone();
                            async move {
                                match counter.fetch_add(1, Ordering::SeqCst) {
                                    0 => Err(Failure::rate_limited("429")),
                                    1 | 2 => Err(Failure::offline("net down")),
                                    _ => Ok(42),
                                }
                            }
                        })
                        .await
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // One rate-limit sleep (1s) plus two network sleeps (2s, 4s).
        assert_eq!(start.elapsed(), Duration::from_millis(7_000));
    }
}
