//! User-configured notification command.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use quotaminder_core::{CoreError, Notifier};

use crate::exec;

/// Placeholder expanded to the notification title.
pub const TITLE_PLACEHOLDER: &str = "{title}";

/// Placeholder expanded to the notification body.
pub const BODY_PLACEHOLDER: &str = "{body}";

/// [`Notifier`] that runs a user-supplied shell command.
///
/// The template may contain `{title}` and `{body}` placeholders. They
/// expand to environment variable references and the actual values
/// travel via the environment, so titles and bodies never pass through
/// shell interpolation.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    template: String,
}

impl CommandNotifier {
    /// Creates a notifier from a command template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn rendered_command(&self) -> String {
        self.template
            .replace(TITLE_PLACEHOLDER, "\"$NOTIFY_TITLE\"")
            .replace(BODY_PLACEHOLDER, "\"$NOTIFY_BODY\"")
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    fn id(&self) -> &str {
        "command"
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), CoreError> {
        let rendered = self.rendered_command();
        debug!(command = %rendered, "Running notification command");

        let mut delivery = Command::new("sh");
        delivery
            .arg("-c")
            .arg(&rendered)
            .env("NOTIFY_TITLE", title)
            .env("NOTIFY_BODY", body);

        exec::run_delivery(&mut delivery).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
