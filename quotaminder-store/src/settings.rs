//! User preferences.
//!
//! Manages user settings with persistence and change notification. The
//! resilience core reads configuration already parsed; everything here
//! is about getting values from disk and the command line into that
//! shape, with validation at the edge.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use quotaminder_poll::{
    FocusGate, PollerConfig, QuietHours, DEFAULT_DND_PERCENT, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_THRESHOLDS, MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS,
};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

/// Environment variable that overrides the persisted API token.
pub const TOKEN_ENV: &str = "QUOTAMINDER_TOKEN";

/// Settings keys accepted by [`Settings::apply`].
pub const KEYS: &[&str] = &[
    "interval",
    "thresholds",
    "snooze-presets",
    "base-url",
    "token",
    "channel",
    "command-template",
    "quiet-hours",
    "dnd",
    "daily-budget",
    "cache-secs",
];

// ============================================================================
// Settings Types
// ============================================================================

/// Which channel delivers notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifyChannel {
    /// The host's native desktop notifications.
    #[default]
    System,
    /// The terminal bell.
    Bell,
    /// A user-supplied command template.
    Command,
}

impl NotifyChannel {
    /// All available channels.
    pub fn all() -> &'static [NotifyChannel] {
        &[
            NotifyChannel::System,
            NotifyChannel::Bell,
            NotifyChannel::Command,
        ]
    }
}

impl std::fmt::Display for NotifyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyChannel::System => write!(f, "system"),
            NotifyChannel::Bell => write!(f, "bell"),
            NotifyChannel::Command => write!(f, "command"),
        }
    }
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between scheduled polls.
    pub poll_interval_secs: u64,

    /// Reminder thresholds in minutes before a quota reset.
    pub reminder_thresholds: Vec<u32>,

    /// Snooze durations offered to the user, in minutes.
    pub snooze_presets: Vec<u32>,

    /// Base URL of the usage API.
    pub api_base_url: String,

    /// Persisted OAuth token. The `QUOTAMINDER_TOKEN` environment
    /// variable overrides it when set.
    pub api_token: Option<String>,

    /// Which channel delivers notifications.
    pub notify_channel: NotifyChannel,

    /// Shell template for the `command` channel, with `{title}` and
    /// `{body}` placeholders.
    pub command_template: Option<String>,

    /// Daily local-time window during which reminders stay silent.
    pub quiet_hours: Option<QuietHours>,

    /// Reminders pause while utilization is above this percentage.
    pub dnd_above_percent: Option<f64>,

    /// Target utilization for today, for pace reporting.
    pub daily_budget_percent: Option<f64>,

    /// Seconds a fetched snapshot is served from the response cache.
    pub cache_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            reminder_thresholds: DEFAULT_THRESHOLDS.to_vec(),
            snooze_presets: vec![5, 15, 30],
            api_base_url: "https://api.anthropic.com".to_string(),
            api_token: None,
            notify_channel: NotifyChannel::default(),
            command_template: None,
            quiet_hours: None,
            dnd_above_percent: None,
            daily_budget_percent: None,
            cache_secs: 60,
        }
    }
}

impl Settings {
    /// Returns the token to use: the environment override when set and
    /// non-empty, otherwise the persisted one.
    pub fn effective_token(&self) -> Option<String> {
        self.resolve_token(std::env::var(TOKEN_ENV).ok())
    }

    fn resolve_token(&self, env_token: Option<String>) -> Option<String> {
        env_token
            .filter(|t| !t.is_empty())
            .or_else(|| self.api_token.clone())
    }

    /// Returns the poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Returns the response cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_secs)
    }

    /// Builds the reminder suppression rules these settings describe.
    pub fn focus_gate(&self) -> FocusGate {
        let mut gate = FocusGate::new();
        if let Some(window) = self.quiet_hours {
            gate = gate.with_quiet_hours(window);
        }
        if let Some(percent) = self.dnd_above_percent {
            gate = gate.with_dnd_above(percent);
        }
        gate
    }

    /// Builds the poller configuration these settings describe.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::new()
            .with_poll_interval(self.poll_interval())
            .with_reminder_thresholds(self.reminder_thresholds.clone())
            .with_focus_gate(self.focus_gate())
    }

    /// Applies a `key value` pair from the command line.
    ///
    /// Values are validated here so bad input is rejected before it is
    /// persisted. Optional settings accept `none` or `off` to clear.
    /// See [`KEYS`] for the accepted keys.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownKey`] for an unrecognized key and
    /// [`StoreError::Config`] when the value does not parse or is out
    /// of range.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match key {
            "interval" => {
                let secs: u64 = parse_number(key, value)?;
                if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&secs) {
                    return Err(StoreError::Config(format!(
                        "interval must be between {MIN_POLL_INTERVAL_SECS} and \
                        {MAX_POLL_INTERVAL_SECS} seconds"
                    )));
                }
                self.poll_interval_secs = secs;
            }
            "thresholds" => self.reminder_thresholds = parse_minute_list(key, value)?,
            "snooze-presets" => self.snooze_presets = parse_minute_list(key, value)?,
            "base-url" => self.api_base_url = value.trim_end_matches('/').to_string(),
            "token" => self.api_token = optional_value(value).map(String::from),
            "channel" => {
                self.notify_channel = match value {
                    "system" => NotifyChannel::System,
                    "bell" => NotifyChannel::Bell,
                    "command" => NotifyChannel::Command,
                    other => {
                        return Err(StoreError::Config(format!(
                            "unknown channel \"{other}\" (expected system, bell, or command)"
                        )));
                    }
                }
            }
            "command-template" => self.command_template = optional_value(value).map(String::from),
            "quiet-hours" => {
                self.quiet_hours = match optional_value(value) {
                    Some(window) => Some(parse_quiet_hours(window)?),
                    None => None,
                }
            }
            "dnd" => {
                self.dnd_above_percent = match optional_value(value) {
                    None => None,
                    Some("on") => Some(DEFAULT_DND_PERCENT),
                    Some(percent) => Some(parse_percent(key, percent)?),
                }
            }
            "daily-budget" => {
                self.daily_budget_percent = match optional_value(value) {
                    Some(percent) => Some(parse_percent(key, percent)?),
                    None => None,
                }
            }
            "cache-secs" => self.cache_secs = parse_number(key, value)?,
            _ => return Err(StoreError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

// ============================================================================
// Value Parsing
// ============================================================================

/// Maps the sentinel values `none` and `off` to a cleared setting.
fn optional_value(value: &str) -> Option<&str> {
    match value {
        "none" | "off" => None,
        other => Some(other),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Config(format!("{key} expects a number, got \"{value}\"")))
}

fn parse_percent(key: &str, value: &str) -> Result<f64, StoreError> {
    let percent: f64 = parse_number(key, value)?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(StoreError::Config(format!(
            "{key} must be between 0 and 100"
        )));
    }
    Ok(percent)
}

fn parse_minute_list(key: &str, value: &str) -> Result<Vec<u32>, StoreError> {
    let minutes = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_number::<u32>(key, part))
        .collect::<Result<Vec<_>, _>>()?;
    if minutes.iter().any(|&m| m == 0) {
        return Err(StoreError::Config(format!(
            "{key} minutes must be positive"
        )));
    }
    Ok(minutes)
}

fn parse_quiet_hours(value: &str) -> Result<QuietHours, StoreError> {
    let Some((start, end)) = value.split_once('-') else {
        return Err(StoreError::Config(format!(
            "quiet-hours expects START-END (e.g. 22-7), got \"{value}\""
        )));
    };
    let start_hour: u32 = parse_number("quiet-hours", start.trim())?;
    let end_hour: u32 = parse_number("quiet-hours", end.trim())?;
    if start_hour > 23 || end_hour > 23 {
        return Err(StoreError::Config(
            "quiet-hours hours must be 0-23".to_string(),
        ));
    }
    Ok(QuietHours::new(start_hour, end_hour))
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store with default settings, without touching disk.
    pub fn new(path: PathBuf) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing file yields defaults; a malformed file is reported and
    /// replaced with defaults rather than blocking startup.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded from disk.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        let (notify, _) = watch::channel(0);
        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        })
    }

    /// Returns the path this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }
}

// ============================================================================
// Tests
// ============================================================================
