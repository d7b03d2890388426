//! Fixed-answer usage source.
//!
//! Useful for demos and for wiring downstream components without
//! network access: every fetch returns the same configured outcome.

use async_trait::async_trait;

use quotaminder_core::{Failure, UsageSnapshot, UsageSource};

/// A [`UsageSource`] that always answers with the same result.
#[derive(Debug, Clone)]
pub struct StaticSource {
    result: Result<UsageSnapshot, Failure>,
}

impl StaticSource {
    /// Creates a source that always yields the given snapshot.
    pub fn with_snapshot(snapshot: UsageSnapshot) -> Self {
        Self {
            result: Ok(snapshot),
        }
    }

    /// Creates a source that always yields the given failure.
    pub fn with_failure(failure: Failure) -> Self {
        Self {
            result: Err(failure),
        }
    }
}

#[async_trait]
impl UsageSource for StaticSource {
    fn id(&self) -> &str {
        "static"
    }

    async fn fetch_usage(&self) -> Result<UsageSnapshot, Failure> {
        self.result.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
