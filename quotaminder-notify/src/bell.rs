//! Terminal bell notifier.

use std::io::Write;

use async_trait::async_trait;

use quotaminder_core::{CoreError, Notifier};

/// [`Notifier`] that rings the terminal bell.
///
/// Writes BEL to stderr so it never interleaves with stdout output.
/// The notification content is not rendered; the bell only marks that
/// something happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellNotifier;

impl BellNotifier {
    /// Creates a bell notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for BellNotifier {
    fn id(&self) -> &str {
        "bell"
    }

    async fn send(&self, _title: &str, _body: &str) -> Result<(), CoreError> {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| CoreError::Notification(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
