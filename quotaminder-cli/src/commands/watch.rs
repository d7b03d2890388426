//! Watch command - live usage monitoring with notifications.

use std::io::{stdout, Write};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::interval;
use tracing::{debug, info};

use quotaminder_core::{PaceGoal, PaceStatus, PollState, UsageSnapshot};
use quotaminder_poll::{
    PollerHandle, UsagePoller, MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS,
};
use quotaminder_store::SettingsStore;

use crate::commands::{build_notifier, build_source};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (30-300, clamped).
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Disable notifications; only render the status screen.
    #[arg(long)]
    pub no_notify: bool,

    /// Use a fixed demo snapshot instead of the network.
    #[arg(long)]
    pub demo: bool,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let settings = store.get().await;

    let mut config = settings.poller_config();
    if let Some(secs) = args.interval {
        config = config.with_poll_interval(Duration::from_secs(secs));
    }
    // The poller clamps on spawn; mirror that for the header.
    let interval_secs = config
        .poll_interval
        .as_secs()
        .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS);

    let source = build_source(&settings, args.demo, None)?;
    info!(
        source = source.id(),
        interval_secs,
        notify = !args.no_notify,
        "Starting watch"
    );

    let mut poller = UsagePoller::new(config, source);
    if !args.no_notify {
        poller = poller.with_notifier(build_notifier(&settings));
    }
    let handle = poller.spawn();

    match cli.format {
        OutputFormat::Json => watch_json(handle).await,
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            watch_text(
                handle,
                &formatter,
                interval_secs,
                &settings.snooze_presets,
                settings.daily_budget_percent,
            )
            .await
        }
    }
}

/// Emits one compact JSON line per settled poll state.
async fn watch_json(handle: PollerHandle) -> Result<()> {
    let formatter = JsonFormatter::new(false);
    let mut state_rx = handle.state();

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                println!("{}", formatter.format(&formatter.state_output(&state))?);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Runs the interactive status screen.
///
/// The screen redraws on every state change and once a second for the
/// countdown. Single-letter commands arrive on stdin; a closed stdin
/// leaves the screen running without them.
async fn watch_text(
    handle: PollerHandle,
    formatter: &TextFormatter,
    interval_secs: u64,
    snooze_presets: &[u32],
    daily_budget: Option<f64>,
) -> Result<()> {
    let mut state_rx = handle.state();
    let mut redraw = interval(Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut last_snapshot: Option<UsageSnapshot> = None;
    let mut notice: Option<String> = None;

    loop {
        tokio::select! {
            _ = redraw.tick() => {}
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    None => stdin_open = false,
                    Some(text) => match parse_command(&text) {
                        Some(WatchCommand::Quit) => break,
                        Some(WatchCommand::Refresh) => {
                            handle.refresh().await?;
                        }
                        Some(WatchCommand::Snooze(minutes)) => {
                            let minutes = minutes
                                .or_else(|| snooze_presets.first().copied())
                                .unwrap_or(5);
                            handle.snooze(minutes).await?;
                            notice = Some(format!("Reminders snoozed for {minutes} minutes"));
                        }
                        Some(WatchCommand::CancelSnooze) => {
                            handle.cancel_snooze().await?;
                            notice = Some("Snooze cancelled".to_string());
                        }
                        None => {
                            debug!(line = %text, "Ignoring unrecognized watch command");
                        }
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }

        let state = state_rx.borrow_and_update().clone();
        if let PollState::Ready(snapshot) = &state {
            last_snapshot = Some(snapshot.clone());
        }

        let displayed = state.snapshot().or(last_snapshot.as_ref());
        let pace = match (daily_budget, displayed) {
            (Some(budget), Some(snapshot)) => {
                Some(PaceGoal::new(budget).assess_now(snapshot.utilization_percent))
            }
            _ => None,
        };

        draw(
            formatter,
            &state,
            last_snapshot.as_ref(),
            pace.as_ref(),
            interval_secs,
            notice.as_deref(),
        )?;
    }

    handle.shutdown().await;
    println!("Stopped.");
    Ok(())
}

/// Redraws the status screen.
fn draw(
    formatter: &TextFormatter,
    state: &PollState,
    last_snapshot: Option<&UsageSnapshot>,
    pace: Option<&PaceStatus>,
    interval_secs: u64,
    notice: Option<&str>,
) -> Result<()> {
    let mut out = stdout();

    // Clear screen
    write!(out, "\x1b[2J\x1b[H")?;

    let now = chrono::Local::now();
    writeln!(
        out,
        "Quotaminder Watch - {} (poll: {}s)",
        now.format("%H:%M:%S"),
        interval_secs
    )?;
    writeln!(out, "{}", "─".repeat(50))?;
    writeln!(out)?;

    writeln!(out, "{}", formatter.format_state(state, last_snapshot, pace))?;
    writeln!(out)?;

    if let Some(notice) = notice {
        writeln!(out, "{notice}")?;
    }
    writeln!(
        out,
        "Commands: [r]efresh  [s]nooze <min>  [c]ancel snooze  [q]uit"
    )?;
    out.flush()?;

    Ok(())
}

// ============================================================================
// Watch Commands
// ============================================================================

/// A keyboard command typed into the watch screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchCommand {
    Refresh,
    Snooze(Option<u32>),
    CancelSnooze,
    Quit,
}

/// Parses one stdin line. Unrecognized input yields `None`.
fn parse_command(line: &str) -> Option<WatchCommand> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "r" | "refresh" => Some(WatchCommand::Refresh),
        "s" | "snooze" => {
            let minutes = parts.next().and_then(|m| m.parse().ok());
            Some(WatchCommand::Snooze(minutes))
        }
        "c" | "cancel" => Some(WatchCommand::CancelSnooze),
        "q" | "quit" | "exit" => Some(WatchCommand::Quit),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
