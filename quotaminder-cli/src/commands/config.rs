//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use quotaminder_store::{
    default_config_dir, default_settings_path, Settings, SettingsStore, StoreError, KEYS,
    TOKEN_ENV,
};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set a configuration value.
    Set {
        /// Setting key (run with a bogus key to list the valid ones).
        key: String,

        /// New value. Optional settings accept `none` or `off` to clear.
        value: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Set { key, value } => set_value(key, value, cli).await,
        ConfigAction::Reset => reset_config(cli).await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("Quotaminder Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Poll interval:    {}s", settings.poll_interval_secs);
            println!(
                "Thresholds:       {} before reset",
                minute_list(&settings.reminder_thresholds)
            );
            println!(
                "Snooze presets:   {}",
                minute_list(&settings.snooze_presets)
            );
            println!("API base URL:     {}", settings.api_base_url);
            println!("API token:        {}", token_display(&settings));
            println!("Notify channel:   {}", settings.notify_channel);
            if let Some(template) = &settings.command_template {
                println!("Command template: {template}");
            }
            println!(
                "Quiet hours:      {}",
                settings
                    .quiet_hours
                    .as_ref()
                    .map_or_else(|| "none".to_string(), |q| format!(
                        "{}-{}",
                        q.start_hour, q.end_hour
                    ))
            );
            println!(
                "DND above:        {}",
                settings
                    .dnd_above_percent
                    .map_or_else(|| "off".to_string(), |p| format!("{p:.0}%"))
            );
            println!(
                "Daily budget:     {}",
                settings
                    .daily_budget_percent
                    .map_or_else(|| "off".to_string(), |p| format!("{p:.0}%"))
            );
            println!("Cache TTL:        {}s", settings.cache_secs);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = formatter.format(&formatter.settings_output(&settings))?;
            println!("{output}");
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_value(key: &str, value: &str, _cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;

    // Validate against a copy so bad input never reaches the store.
    let mut settings = store.get().await;
    match settings.apply(key, value) {
        Ok(()) => {}
        Err(StoreError::UnknownKey(key)) => {
            anyhow::bail!("unknown key \"{}\" (valid keys: {})", key, KEYS.join(", "));
        }
        Err(error) => return Err(error.into()),
    }

    store.update(|s| *s = settings).await;
    store.save().await?;

    info!(key = %key, "Setting updated");
    if key == "token" {
        // Never echo the value back.
        println!("Token updated");
    } else {
        println!("{key} set to {value}");
    }

    Ok(())
}

async fn reset_config(_cli: &Cli) -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}

/// Joins minute values as "30m, 15m, 5m".
fn minute_list(minutes: &[u32]) -> String {
    minutes
        .iter()
        .map(|m| format!("{m}m"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Describes the token without revealing it.
fn token_display(settings: &Settings) -> &'static str {
    if std::env::var(TOKEN_ENV).is_ok_and(|v| !v.is_empty()) {
        "set (from environment)"
    } else if settings.api_token.is_some() {
        "set"
    } else {
        "none"
    }
}
