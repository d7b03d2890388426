//! Check command - one-shot usage fetch.

use anyhow::Result;
use clap::Args;
use tracing::info;

use quotaminder_core::{Failure, FailureKind, PaceGoal, PaceStatus, UsageSnapshot};
use quotaminder_poll::poll_once;
use quotaminder_store::SettingsStore;

use crate::commands::build_source;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the check command.
#[derive(Args, Default)]
pub struct CheckArgs {
    /// API token override for this invocation.
    #[arg(long)]
    pub token: Option<String>,

    /// Use a fixed demo snapshot instead of the network.
    #[arg(long)]
    pub demo: bool,
}

/// Runs the check command.
///
/// The fetch goes through the same stacked retry chain the watch poller
/// uses, so a rate-limited or briefly-offline API still yields a result
/// instead of an immediate failure.
pub async fn run(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let settings = store.get().await;
    let source = build_source(&settings, args.demo, args.token.as_deref())?;

    info!(source = source.id(), "Checking usage");

    match poll_once(source, false).await {
        Ok(snapshot) => {
            let pace = settings
                .daily_budget_percent
                .map(|budget| PaceGoal::new(budget).assess_now(snapshot.utilization_percent));
            print_snapshot(&snapshot, pace.as_ref(), cli)?;
            Ok(())
        }
        Err(failure) => {
            print_failure(&failure, cli)?;
            std::process::exit(exit_code_for(&failure) as i32);
        }
    }
}

fn print_snapshot(snapshot: &UsageSnapshot, pace: Option<&PaceStatus>, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_snapshot(snapshot, pace));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = formatter.snapshot_output(snapshot, pace);
            println!("{}", formatter.format(&output)?);
        }
    }
    Ok(())
}

fn print_failure(failure: &Failure, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_failure(failure));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = formatter.failure_output(failure);
            println!("{}", formatter.format(&output)?);
        }
    }
    Ok(())
}

/// Maps a terminal failure to the process exit code.
fn exit_code_for(failure: &Failure) -> ExitCode {
    match failure.classify() {
        FailureKind::TokenExpired => ExitCode::TokenExpired,
        _ => ExitCode::Error,
    }
}

// ============================================================================
// Tests
// ============================================================================
