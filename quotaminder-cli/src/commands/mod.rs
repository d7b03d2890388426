//! CLI command implementations.

pub mod check;
pub mod config;
pub mod watch;

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use tracing::warn;

use quotaminder_core::{Notifier, UsageSnapshot, UsageSource};
use quotaminder_notify::{BellNotifier, CommandNotifier, FallbackNotifier, SystemNotifier};
use quotaminder_source::{HttpUsageSource, StaticSource};
use quotaminder_store::{NotifyChannel, Settings, TOKEN_ENV};

/// Builds the usage source the settings describe.
///
/// `demo` swaps in a fixed snapshot so output and watch wiring can be
/// exercised without credentials or network access.
///
/// # Errors
///
/// Returns an error when no API token is configured.
pub fn build_source(
    settings: &Settings,
    demo: bool,
    token_override: Option<&str>,
) -> Result<Arc<dyn UsageSource>> {
    if demo {
        return Ok(Arc::new(StaticSource::with_snapshot(demo_snapshot())));
    }

    let token = match token_override {
        Some(token) => token.to_string(),
        None => match settings.effective_token() {
            Some(token) => token,
            None => bail!(
                "no API token configured (set one with `quotaminder config set token <value>` \
                or the {TOKEN_ENV} environment variable, or pass --demo)"
            ),
        },
    };

    let source = HttpUsageSource::new(token)
        .with_base_url(&settings.api_base_url)
        .with_cache_ttl(settings.cache_ttl());
    Ok(Arc::new(source))
}

/// Builds the notifier chain the settings select.
///
/// The system channel carries a terminal-bell fallback for hosts whose
/// desktop notification command is missing or failing.
pub fn build_notifier(settings: &Settings) -> Arc<dyn Notifier> {
    match settings.notify_channel {
        NotifyChannel::System => Arc::new(FallbackNotifier::new(
            Arc::new(SystemNotifier::new()),
            Arc::new(BellNotifier::new()),
        )),
        NotifyChannel::Bell => Arc::new(BellNotifier::new()),
        NotifyChannel::Command => match &settings.command_template {
            Some(template) => Arc::new(CommandNotifier::new(template)),
            None => {
                warn!("Command channel selected without a template, using bell");
                Arc::new(BellNotifier::new())
            }
        },
    }
}

/// A plausible mid-window snapshot for `--demo` runs.
fn demo_snapshot() -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(42.0);
    snapshot.resets_at = Some(Utc::now() + Duration::hours(2));
    snapshot.window_minutes = Some(300);
    snapshot.tokens_used = Some(420_000);
    snapshot.tokens_limit = Some(1_000_000);
    snapshot
}

// ============================================================================
// Tests
// ============================================================================
