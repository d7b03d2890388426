//! Desktop notifications through the host's native command.
//!
//! Uses `osascript` on macOS and `notify-send` elsewhere. The delivery
//! command is resolved from PATH once at construction; hosts without it
//! report unavailable instead of failing every send.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use quotaminder_core::{CoreError, Notifier};

use crate::error::NotifyError;
use crate::exec;

#[cfg(target_os = "macos")]
const NOTIFY_COMMAND: &str = "osascript";

#[cfg(not(target_os = "macos"))]
const NOTIFY_COMMAND: &str = "notify-send";

/// Application name shown by notification daemons.
const APP_NAME: &str = "Quotaminder";

// ============================================================================
// System Notifier
// ============================================================================

/// [`Notifier`] backed by the host's native notification command.
#[derive(Debug, Clone)]
pub struct SystemNotifier {
    command: Option<PathBuf>,
}

impl SystemNotifier {
    /// Creates a notifier, probing PATH for the delivery command.
    pub fn new() -> Self {
        let command = which::which(NOTIFY_COMMAND).ok();
        if command.is_none() {
            debug!(command = NOTIFY_COMMAND, "Notification command not on PATH");
        }
        Self { command }
    }
}

impl Default for SystemNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the argument list for the platform's delivery command.
///
/// On macOS the title and body are embedded in an AppleScript literal;
/// on other platforms they are separate argv entries and need no
/// escaping.
fn delivery_args(title: &str, body: &str) -> Vec<String> {
    if cfg!(target_os = "macos") {
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            applescript_escape(body),
            applescript_escape(title)
        );
        vec!["-e".to_string(), script]
    } else {
        vec![
            "--app-name".to_string(),
            APP_NAME.to_string(),
            title.to_string(),
            body.to_string(),
        ]
    }
}

/// Escapes a string for embedding in a double-quoted AppleScript literal.
fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl Notifier for SystemNotifier {
    fn id(&self) -> &str {
        "system"
    }

    fn is_available(&self) -> bool {
        self.command.is_some()
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), CoreError> {
        let Some(ref command) = self.command else {
            return Err(NotifyError::NoCommand(NOTIFY_COMMAND.to_string()).into());
        };

        debug!(command = %command.display(), title = %title, "Delivering desktop notification");

        let mut delivery = Command::new(command);
        delivery.args(delivery_args(title, body));

        exec::run_delivery(&mut delivery).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
