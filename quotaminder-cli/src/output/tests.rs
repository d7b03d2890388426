//! CLI output formatting tests.
//!
//! These tests verify that usage, state, and settings output is
//! correctly formatted for both text and JSON modes.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use chrono::{Duration, Utc};
    use quotaminder_core::{PaceGoal, PollState, UsageSnapshot};

    fn full_snapshot() -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(42.0);
        snapshot.resets_at = Some(Utc::now() + Duration::hours(2));
        snapshot.window_minutes = Some(300);
        snapshot.tokens_used = Some(420_000);
        snapshot.tokens_limit = Some(1_000_000);
        snapshot
    }

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (42.0, "████░░░░░░"), // 4.2 rounds to 4 blocks
            (75.0, "████████░░"), // 7.5 rounds to 8 blocks
            (100.0, "██████████"),
        ];

        for (percent, expected) in test_cases {
            let bar = formatter.progress_bar(percent);
            assert_eq!(bar, expected, "Failed for {}% used", percent);
        }
    }

    #[test]
    fn test_progress_bar_with_colors() {
        let formatter = TextFormatter::new(true);

        // Critical usage - should be red
        let bar = formatter.progress_bar(95.0);
        assert!(bar.contains("\x1b[31m"), "Should be red for >=90% used");

        // High usage - should be yellow
        let bar = formatter.progress_bar(80.0);
        assert!(bar.contains("\x1b[33m"), "Should be yellow for >=75% used");

        // Normal usage - should be green
        let bar = formatter.progress_bar(40.0);
        assert!(bar.contains("\x1b[32m"), "Should be green for <75% used");
    }

    #[test]
    fn test_format_snapshot_full() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_snapshot(&full_snapshot(), None);

        assert!(output.contains("42% used"));
        assert!(output.contains("left"));
        assert!(output.contains("420.0K / 1.0M"));
    }

    #[test]
    fn test_format_snapshot_omits_unknown_tokens() {
        let formatter = TextFormatter::new(false);
        let snapshot = UsageSnapshot::new(42.0);
        let output = formatter.format_snapshot(&snapshot, None);

        assert!(!output.contains("Tokens:"));
        assert!(!output.contains("Resets:"));
    }

    #[test]
    fn test_format_snapshot_includes_pace() {
        let formatter = TextFormatter::new(false);
        let pace = PaceGoal::new(50.0).assess_at(12.0, 20.0);
        let output = formatter.format_snapshot(&full_snapshot(), Some(&pace));

        assert!(output.contains("Pace:"));
        assert!(output.contains("On track"));
    }

    #[test]
    fn test_format_state_ready() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_state(&PollState::Ready(full_snapshot()), None, None);
        assert!(output.contains("42% used"));
    }

    #[test]
    fn test_format_state_degraded_keeps_last_snapshot() {
        let formatter = TextFormatter::new(false);
        let last = full_snapshot();
        let output = formatter.format_state(&PollState::Offline, Some(&last), None);

        assert!(output.contains("Offline"));
        assert!(output.contains("Last known"));
        assert!(output.contains("42% used"));
    }

    #[test]
    fn test_format_state_loading_without_history() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_state(&PollState::Loading, None, None);
        assert!(output.contains("Loading usage"));
    }

    #[test]
    fn test_format_state_loading_with_history() {
        let formatter = TextFormatter::new(false);
        let last = full_snapshot();
        let output = formatter.format_state(&PollState::Loading, Some(&last), None);

        // An in-flight refresh keeps the old numbers on screen.
        assert!(output.contains("Last known"));
        assert!(output.contains("42% used"));
    }

    #[test]
    fn test_format_state_errored_shows_message() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_state(&PollState::Errored("token expired".into()), None, None);
        assert!(output.contains("Error: token expired"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use chrono::{Duration, Utc};
    use quotaminder_core::{Failure, PollState, UsageSnapshot};
    use quotaminder_store::Settings;

    #[test]
    fn test_snapshot_serializes_as_camel_case() {
        let formatter = JsonFormatter::new(false);
        let mut snapshot = UsageSnapshot::new(42.0);
        snapshot.resets_at = Some(Utc::now() + Duration::hours(2));

        let output = formatter
            .format(&formatter.snapshot_output(&snapshot, None))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["utilizationPercent"], 42.0);
        assert_eq!(parsed["remainingPercent"], 58.0);
        assert!(parsed.get("fetchedAt").is_some());
        assert!(parsed["secondsUntilReset"].as_i64().unwrap() > 7000);
    }

    #[test]
    fn test_failure_output_status_handling() {
        let formatter = JsonFormatter::new(false);

        let with_status = formatter.failure_output(&Failure::new("server error").with_status(502));
        let output = formatter.format(&with_status).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["status"], 502);
        assert_eq!(parsed["kind"], "network_error");

        // Status 0 means "no server reached"; not worth emitting.
        let unreached = formatter.failure_output(&Failure::new("no response").with_status(0));
        let output = formatter.format(&unreached).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(parsed.get("status").is_none());
    }

    #[test]
    fn test_settings_output_masks_token() {
        let formatter = JsonFormatter::new(false);
        let settings = Settings {
            api_token: Some("secret-token-value".to_string()),
            ..Settings::default()
        };

        let output = formatter.format(&formatter.settings_output(&settings)).unwrap();
        assert!(!output.contains("secret-token-value"));

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["apiTokenSet"], true);
    }

    #[test]
    fn test_settings_output_quiet_hours_string() {
        let formatter = JsonFormatter::new(false);
        let settings = Settings {
            quiet_hours: Some(quotaminder_poll::QuietHours::new(22, 7)),
            ..Settings::default()
        };

        let output = formatter.format(&formatter.settings_output(&settings)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["quietHours"], "22-7");
    }

    #[test]
    fn test_state_output_serializes_ready() {
        let formatter = JsonFormatter::new(false);
        let state = PollState::Ready(UsageSnapshot::new(10.0));

        let output = formatter.format(&formatter.state_output(&state)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["state"], "ready");
        assert_eq!(parsed["snapshot"]["utilizationPercent"], 10.0);
        assert!(parsed.get("error").is_none());
    }
}

// ============================================================================
// Output Snapshot Tests (for regression testing)
// ============================================================================

#[cfg(test)]
mod output_snapshot_tests {
    use super::super::text::TextFormatter;
    use chrono::{Duration, Utc};
    use quotaminder_core::{PaceGoal, UsageSnapshot};

    /// These tests capture expected output format for regression testing.
    /// If the output format changes, these tests will fail.

    #[test]
    fn test_progress_bar_width_consistency() {
        let formatter = TextFormatter::new(false);

        // All progress bars should have the same width
        for percent in [0.0, 25.0, 50.0, 75.0, 100.0] {
            let bar = formatter.progress_bar(percent);
            let char_count: usize = bar.chars().count();
            assert_eq!(char_count, 10, "Bar for {}% has {} chars", percent, char_count);
        }
    }

    #[test]
    fn test_snapshot_line_order() {
        let formatter = TextFormatter::new(false);
        let mut snapshot = UsageSnapshot::new(42.0);
        snapshot.resets_at = Some(Utc::now() + Duration::hours(2));
        snapshot.tokens_used = Some(420_000);
        snapshot.tokens_limit = Some(1_000_000);
        let pace = PaceGoal::new(50.0).assess_at(12.0, 42.0);

        let output = formatter.format_snapshot(&snapshot, Some(&pace));
        let labels: Vec<&str> = output
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .collect();

        assert_eq!(labels, vec!["Usage:", "Resets:", "Tokens:", "Pace:"]);
    }
}
