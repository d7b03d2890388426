//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use quotaminder_core::{Failure, FailureKind, PaceStatus, PollState, UsageSnapshot};
use quotaminder_store::Settings;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one usage snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotOutput {
    pub utilization_percent: f64,
    pub remaining_percent: f64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_datetime_opt"
    )]
    pub resets_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_until_reset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_remaining: Option<u64>,
    #[serde(serialize_with = "serialize_datetime")]
    pub fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<PaceOutput>,
}

/// Pace assessment against the daily budget.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceOutput {
    pub on_track: bool,
    pub current_percent: f64,
    pub expected_percent: f64,
}

/// A terminal poll failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureOutput {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// One poll-state transition, as emitted by `watch --format json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateOutput {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_datetime")]
    pub at: DateTime<Utc>,
}

/// Settings as shown by `config show`. The token itself never appears;
/// only whether one is configured.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOutput {
    pub poll_interval_secs: u64,
    pub reminder_thresholds: Vec<u32>,
    pub snooze_presets: Vec<u32>,
    pub api_base_url: String,
    pub api_token_set: bool,
    pub notify_channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnd_above_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget_percent: Option<f64>,
    pub cache_secs: u64,
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Converts a snapshot, plus an optional pace assessment, to output.
    pub fn snapshot_output(
        &self,
        snapshot: &UsageSnapshot,
        pace: Option<&PaceStatus>,
    ) -> SnapshotOutput {
        SnapshotOutput {
            utilization_percent: snapshot.utilization_percent,
            remaining_percent: snapshot.remaining_percent(),
            resets_at: snapshot.resets_at,
            seconds_until_reset: snapshot.time_until_reset().map(|d| d.num_seconds()),
            window_minutes: snapshot.window_minutes,
            tokens_used: snapshot.tokens_used,
            tokens_limit: snapshot.tokens_limit,
            tokens_remaining: snapshot.tokens_remaining(),
            fetched_at: snapshot.fetched_at,
            pace: pace.map(|p| PaceOutput {
                on_track: p.on_track,
                current_percent: p.current_percent,
                expected_percent: p.expected_percent,
            }),
        }
    }

    /// Converts a terminal failure to output.
    pub fn failure_output(&self, failure: &Failure) -> FailureOutput {
        FailureOutput {
            error: failure.message.clone(),
            kind: self.kind_name(failure.classify()).to_string(),
            status: failure.status.filter(|s| *s > 0),
        }
    }

    /// Converts a poll state to output.
    pub fn state_output(&self, state: &PollState) -> StateOutput {
        let (snapshot, error) = match state {
            PollState::Ready(snapshot) => (Some(self.snapshot_output(snapshot, None)), None),
            PollState::Errored(message) => (None, Some(message.clone())),
            _ => (None, None),
        };

        StateOutput {
            state: self.state_name(state).to_string(),
            snapshot,
            error,
            at: Utc::now(),
        }
    }

    /// Converts settings to output, masking the token.
    pub fn settings_output(&self, settings: &Settings) -> SettingsOutput {
        SettingsOutput {
            poll_interval_secs: settings.poll_interval_secs,
            reminder_thresholds: settings.reminder_thresholds.clone(),
            snooze_presets: settings.snooze_presets.clone(),
            api_base_url: settings.api_base_url.clone(),
            api_token_set: settings.effective_token().is_some(),
            notify_channel: settings.notify_channel.to_string(),
            command_template: settings.command_template.clone(),
            quiet_hours: settings
                .quiet_hours
                .as_ref()
                .map(|q| format!("{}-{}", q.start_hour, q.end_hour)),
            dnd_above_percent: settings.dnd_above_percent,
            daily_budget_percent: settings.daily_budget_percent,
            cache_secs: settings.cache_secs,
        }
    }

    /// Stable machine name for a failure kind.
    fn kind_name(&self, kind: FailureKind) -> &'static str {
        match kind {
            FailureKind::TokenExpired => "token_expired",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::NetworkError => "network_error",
            FailureKind::Unknown => "unknown",
        }
    }

    /// Stable machine name for a poll state.
    fn state_name(&self, state: &PollState) -> &'static str {
        match state {
            PollState::Loading => "loading",
            PollState::Ready(_) => "ready",
            PollState::Offline => "offline",
            PollState::RateLimited => "rate_limited",
            PollState::Errored(_) => "errored",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
