//! Two-stage notifier with fallback.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use quotaminder_core::{CoreError, Notifier};

/// [`Notifier`] that tries a primary channel and falls back on error.
///
/// The fallback runs only when the primary is unavailable or its send
/// fails; a successful primary send never reaches the fallback.
pub struct FallbackNotifier {
    primary: Arc<dyn Notifier>,
    fallback: Arc<dyn Notifier>,
}

impl FallbackNotifier {
    /// Creates a notifier that prefers `primary`.
    pub fn new(primary: Arc<dyn Notifier>, fallback: Arc<dyn Notifier>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Notifier for FallbackNotifier {
    fn id(&self) -> &str {
        "fallback"
    }

    fn is_available(&self) -> bool {
        self.primary.is_available() || self.fallback.is_available()
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), CoreError> {
        if self.primary.is_available() {
            match self.primary.send(title, body).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        primary = self.primary.id(),
                        fallback = self.fallback.id(),
                        error = %e,
                        "Primary notifier failed, using fallback"
                    );
                }
            }
        }

        self.fallback.send(title, body).await
    }
}

// ============================================================================
// Tests
// ============================================================================
