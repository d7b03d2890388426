// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Quotaminder CLI - usage-quota monitoring from the command line.
//!
//! # Examples
//!
//! ```bash
//! # One-shot usage check (default command)
//! quotaminder
//!
//! # JSON output
//! quotaminder check --format json --pretty
//!
//! # Live status screen with notifications
//! quotaminder watch
//!
//! # Faster polling, no notifications
//! quotaminder watch --interval 30 --no-notify
//!
//! # Try the screen without credentials
//! quotaminder watch --demo
//!
//! # Inspect and edit settings
//! quotaminder config show
//! quotaminder config set interval 120
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{check, config, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// Quotaminder CLI - usage-quota monitoring.
#[derive(Parser)]
#[command(name = "quotaminder")]
#[command(about = "LLM usage-quota monitor with reset reminders")]
#[command(long_about = r#"
Quotaminder polls an LLM usage API and keeps you ahead of the quota:
differentiated retry for offline and rate-limited periods, usage
warnings at 75% and 90%, and reminders before each quota reset.

Examples:
  quotaminder                       # One-shot check (same as `check`)
  quotaminder check --format json   # JSON output for scripting
  quotaminder watch                 # Live status screen + notifications
  quotaminder watch --demo          # Try the screen without credentials
  quotaminder config set dnd 85     # Pause reminders above 85% usage
"#)]
#[command(version)]
#[command(author = "Quotaminder Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'check' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch current usage once (default if no command specified).
    #[command(visible_alias = "c")]
    Check(check::CheckArgs),

    /// Watch usage continuously with notifications.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error (offline, rate limited, unknown failure).
    Error = 1,
    /// Credentials rejected; the user must re-authenticate.
    TokenExpired = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("quotaminder=debug,info")
    } else {
        EnvFilter::new("quotaminder=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Check(args)) => check::run(args, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => {
            // Default to check command
            check::run(&check::CheckArgs::default(), &cli).await
        }
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
