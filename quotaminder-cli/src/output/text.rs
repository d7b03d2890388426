//! Text output formatting with progress bars and colors.

use chrono::{Local, Utc};
use quotaminder_core::{Countdown, Failure, PaceStatus, PollState, UsageSnapshot};
use quotaminder_poll::{CRITICAL_USAGE_PERCENT, HIGH_USAGE_PERCENT};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Set the progress bar width.
    #[allow(dead_code)]
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    /// Formats one snapshot as labelled lines.
    ///
    /// Labels are padded before coloring; ANSI escapes inside a padded
    /// field would break the column alignment.
    pub fn format_snapshot(&self, snapshot: &UsageSnapshot, pace: Option<&PaceStatus>) -> String {
        let mut lines = Vec::new();

        let used = snapshot.utilization_percent;
        lines.push(format!(
            "{:<8} {} {} {}",
            "Usage:",
            self.progress_bar(used),
            self.color_for_usage(used, &format!("{used:.0}% used")),
            self.dim(&format!("({:.0}% left)", snapshot.remaining_percent()))
        ));

        if let Some(resets_at) = snapshot.resets_at {
            let countdown = Countdown::until(resets_at, Utc::now());
            let local = resets_at.with_timezone(&Local);
            lines.push(format!(
                "{:<8} {} {}",
                "Resets:",
                self.cyan(&countdown.human_readable()),
                self.dim(&format!("(at {})", local.format("%H:%M")))
            ));
        }

        if let (Some(tokens_used), Some(tokens_limit)) =
            (snapshot.tokens_used, snapshot.tokens_limit)
        {
            lines.push(format!(
                "{:<8} {} / {}",
                "Tokens:",
                self.format_number(tokens_used as f64),
                self.format_number(tokens_limit as f64)
            ));
        }

        if let Some(pace) = pace {
            let text = pace.to_string();
            let colored = if pace.on_track {
                self.green(&text)
            } else {
                self.yellow(&text)
            };
            lines.push(format!("{:<8} {}", "Pace:", colored));
        }

        lines.join("\n")
    }

    /// Formats the poller state for the watch screen.
    ///
    /// Degraded states keep rendering the last good snapshot, marked
    /// with its fetch time, beneath the status line.
    pub fn format_state(
        &self,
        state: &PollState,
        last_snapshot: Option<&UsageSnapshot>,
        pace: Option<&PaceStatus>,
    ) -> String {
        match state {
            PollState::Ready(snapshot) => self.format_snapshot(snapshot, pace),
            PollState::Loading if last_snapshot.is_none() => self.dim("Loading usage..."),
            _ => {
                let mut lines = vec![self.status_line(state)];
                if let Some(snapshot) = last_snapshot {
                    let fetched = snapshot.fetched_at.with_timezone(&Local);
                    lines.push(String::new());
                    lines.push(self.dim(&format!(
                        "Last known (fetched {}):",
                        fetched.format("%H:%M:%S")
                    )));
                    lines.push(self.format_snapshot(snapshot, pace));
                }
                lines.join("\n")
            }
        }
    }

    /// One-line status for non-ready states.
    fn status_line(&self, state: &PollState) -> String {
        let text = format!("{} {}", state.symbol(), state);
        match state {
            PollState::Offline | PollState::Errored(_) => self.red(&text),
            PollState::RateLimited => self.yellow(&text),
            _ => self.dim(&text),
        }
    }

    /// Formats a terminal poll failure.
    pub fn format_failure(&self, failure: &Failure) -> String {
        let kind = failure.classify();
        format!("{} {}", self.red(&format!("✗ {}:", kind.label())), failure)
    }

    /// Formats a progress bar filled by percent used.
    pub fn progress_bar(&self, percent_used: f64) -> String {
        let filled = ((percent_used / 100.0) * self.bar_width as f64).round() as usize;
        let filled = filled.min(self.bar_width);
        let empty = self.bar_width - filled;

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_usage(percent_used, &bar)
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    /// Colors text by usage severity, on the poller's warning thresholds.
    fn color_for_usage(&self, percent_used: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent_used >= CRITICAL_USAGE_PERCENT {
            self.red(text)
        } else if percent_used >= HIGH_USAGE_PERCENT {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn format_number(&self, n: f64) -> String {
        if n >= 1_000_000.0 {
            format!("{:.1}M", n / 1_000_000.0)
        } else if n >= 1_000.0 {
            format!("{:.1}K", n / 1_000.0)
        } else {
            format!("{n:.0}")
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.use_colors {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        if self.use_colors {
            format!("{GREEN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn yellow(&self, text: &str) -> String {
        if self.use_colors {
            format!("{YELLOW}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.use_colors {
            format!("{RED}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn cyan(&self, text: &str) -> String {
        if self.use_colors {
            format!("{CYAN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_empty() {
        let formatter = TextFormatter::new(false);
        let bar = formatter.progress_bar(0.0);
        assert_eq!(bar, "░░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_full() {
        let formatter = TextFormatter::new(false);
        let bar = formatter.progress_bar(100.0);
        assert_eq!(bar, "██████████");
    }

    #[test]
    fn test_progress_bar_half() {
        let formatter = TextFormatter::new(false);
        let bar = formatter.progress_bar(50.0);
        assert_eq!(bar, "█████░░░░░");
    }

    #[test]
    fn test_format_number() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_number(500.0), "500");
        assert_eq!(formatter.format_number(1500.0), "1.5K");
        assert_eq!(formatter.format_number(1_500_000.0), "1.5M");
    }

    #[test]
    fn test_color_for_usage() {
        let formatter = TextFormatter::new(true);
        let critical = formatter.color_for_usage(95.0, "test");
        assert!(critical.contains(RED));

        let high = formatter.color_for_usage(80.0, "test");
        assert!(high.contains(YELLOW));

        let normal = formatter.color_for_usage(40.0, "test");
        assert!(normal.contains(GREEN));
    }

    #[test]
    fn test_format_failure_names_the_kind() {
        let formatter = TextFormatter::new(false);
        let failure = Failure::token_expired("credentials rejected").with_status(401);
        let output = formatter.format_failure(&failure);
        assert!(output.contains("token expired"));
        assert!(output.contains("credentials rejected (HTTP 401)"));
    }
}
