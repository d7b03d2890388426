//! The usage poller task.
//!
//! [`UsagePoller::spawn`] starts one orchestrator task that owns every
//! piece of mutable polling state: the schedule, the in-flight poll,
//! reminder evaluation, snooze, warning dedup, and the notification
//! throttle. Callers interact through a [`PollerHandle`]; states are
//! published on a watch channel: `Loading` when a cycle starts, then
//! the settled [`PollState`] outcome.
//!
//! One poll cycle runs the fetch through two stacked retry executors
//! (connectivity inside, backpressure outside) on its own task, so the
//! orchestrator keeps serving reminder ticks and commands while a slow
//! cycle backs off. Scheduled ticks that land while a cycle is running
//! are dropped, never queued.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, MissedTickBehavior};
use tracing::{debug, info, warn};

use quotaminder_core::{Failure, FailureKind, Notifier, PollState, UsageSnapshot, UsageSource};

use crate::config::{clamp_poll_interval, PollerConfig, REMINDER_TICK_SECS};
use crate::error::PollError;
use crate::reminder::ReminderScheduler;
use crate::retry::RetryExecutor;
use crate::suppress::FocusGate;
use crate::throttle::NotificationThrottle;

/// Usage percentage at which the critical alert fires.
pub const CRITICAL_USAGE_PERCENT: f64 = 90.0;
/// Usage percentage at which the high-usage warning fires.
pub const HIGH_USAGE_PERCENT: f64 = 75.0;

// ============================================================================
// Commands & Handle
// ============================================================================

/// Commands accepted by the running poller.
#[derive(Debug)]
enum PollerCommand {
    RefreshNow,
    Snooze { minutes: u32 },
    CancelSnooze,
    SetInterval(Duration),
    SetThresholds(Vec<u32>),
    Shutdown,
}

/// Handle to a spawned poller.
///
/// Cloning the state receiver is cheap; commands are serviced by the
/// orchestrator in arrival order.
pub struct PollerHandle {
    commands: mpsc::Sender<PollerCommand>,
    state_rx: watch::Receiver<PollState>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Returns a receiver for observing poll states. Each cycle
    /// publishes [`PollState::Loading`], then its settled outcome.
    pub fn state(&self) -> watch::Receiver<PollState> {
        self.state_rx.clone()
    }

    /// Returns the most recently published state.
    pub fn current_state(&self) -> PollState {
        self.state_rx.borrow().clone()
    }

    /// Requests an immediate poll, bypassing the source cache and
    /// resetting the schedule phase. Dropped if a poll is running.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::NotRunning`] when the poller has stopped.
    pub async fn refresh(&self) -> Result<(), PollError> {
        self.send(PollerCommand::RefreshNow).await
    }

    /// Silences reminder notifications for the given number of minutes.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::NotRunning`] when the poller has stopped.
    pub async fn snooze(&self, minutes: u32) -> Result<(), PollError> {
        self.send(PollerCommand::Snooze { minutes }).await
    }

    /// Lifts an active snooze.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::NotRunning`] when the poller has stopped.
    pub async fn cancel_snooze(&self) -> Result<(), PollError> {
        self.send(PollerCommand::CancelSnooze).await
    }

    /// Changes the poll interval. Out-of-range values are clamped.
    /// Takes effect from the next schedule, one full interval out.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::NotRunning`] when the poller has stopped.
    pub async fn set_interval(&self, poll_interval: Duration) -> Result<(), PollError> {
        self.send(PollerCommand::SetInterval(poll_interval)).await
    }

    /// Replaces the reminder thresholds without touching fired memory.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::NotRunning`] when the poller has stopped.
    pub async fn set_thresholds(&self, thresholds: Vec<u32>) -> Result<(), PollError> {
        self.send(PollerCommand::SetThresholds(thresholds)).await
    }

    /// Stops the poller, aborting any in-flight poll.
    pub async fn shutdown(self) {
        let _ = self.commands.send(PollerCommand::Shutdown).await;
        let _ = self.task.await;
    }

    async fn send(&self, command: PollerCommand) -> Result<(), PollError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PollError::NotRunning)
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Builder for the poller task.
pub struct UsagePoller {
    config: PollerConfig,
    source: Arc<dyn UsageSource>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl UsagePoller {
    /// Creates a poller over the given source, with no notifier wired.
    pub fn new(config: PollerConfig, source: Arc<dyn UsageSource>) -> Self {
        Self {
            config,
            source,
            notifier: None,
        }
    }

    /// Wires a notifier for warnings, reminders, and failure alerts.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sanitizes the configuration and starts the orchestrator task.
    ///
    /// The first poll runs immediately.
    pub fn spawn(mut self) -> PollerHandle {
        self.config.sanitize();
        let (state_tx, state_rx) = watch::channel(PollState::Loading);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        info!(
            source = self.source.id(),
            interval_secs = self.config.poll_interval.as_secs(),
            "Starting usage poller"
        );
        let task = tokio::spawn(run(self.config, self.source, self.notifier, state_tx, cmd_rx));

        PollerHandle {
            commands: cmd_tx,
            state_rx,
            task,
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Mutable state owned by the orchestrator task.
struct Orchestrator {
    notifier: Option<Arc<dyn Notifier>>,
    state_tx: watch::Sender<PollState>,
    scheduler: ReminderScheduler,
    throttle: NotificationThrottle,
    focus: FocusGate,
    snooze_until: Option<DateTime<Utc>>,
    latest_snapshot: Option<UsageSnapshot>,
    last_warned_percent: f64,
    last_settled: &'static str,
}

async fn run(
    config: PollerConfig,
    source: Arc<dyn UsageSource>,
    notifier: Option<Arc<dyn Notifier>>,
    state_tx: watch::Sender<PollState>,
    mut commands: mpsc::Receiver<PollerCommand>,
) {
    let mut orchestrator = Orchestrator {
        notifier,
        state_tx,
        scheduler: ReminderScheduler::new(config.reminder_thresholds.clone()),
        throttle: NotificationThrottle::new(),
        focus: config.focus,
        snooze_until: None,
        latest_snapshot: None,
        last_warned_percent: 0.0,
        last_settled: PollState::Loading.label(),
    };

    // First tick fires immediately, so the first poll runs at startup.
    let mut poll_timer = interval(config.poll_interval);
    poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Reminders wait one full period: there is nothing to evaluate
    // before the first poll settles.
    let reminder_tick = Duration::from_secs(REMINDER_TICK_SECS);
    let mut reminder_timer = interval_at(tokio::time::Instant::now() + reminder_tick, reminder_tick);
    reminder_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<JoinHandle<Result<UsageSnapshot, Failure>>> = None;

    loop {
        tokio::select! {
            _ = poll_timer.tick() => {
                if in_flight.is_some() {
                    debug!("Previous poll still running, skipping scheduled tick");
                } else {
                    orchestrator.begin_cycle();
                    in_flight = Some(spawn_poll_cycle(source.clone(), false));
                }
            }
            _ = reminder_timer.tick() => {
                orchestrator.reminder_tick(Utc::now()).await;
            }
            result = join_poll_cycle(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                orchestrator.settle(result).await;
            }
            command = commands.recv() => {
                match command {
                    Some(PollerCommand::RefreshNow) => {
                        if in_flight.is_some() {
                            debug!("Refresh requested while a poll is running, coalescing");
                        } else {
                            orchestrator.begin_cycle();
                            in_flight = Some(spawn_poll_cycle(source.clone(), true));
                            poll_timer.reset();
                        }
                    }
                    Some(PollerCommand::Snooze { minutes }) => {
                        let until = Utc::now() + chrono::Duration::minutes(i64::from(minutes));
                        info!(minutes, until = %until, "Reminders snoozed");
                        orchestrator.snooze_until = Some(until);
                    }
                    Some(PollerCommand::CancelSnooze) => {
                        orchestrator.snooze_until = None;
                    }
                    Some(PollerCommand::SetInterval(requested)) => {
                        let poll_interval = clamp_poll_interval(requested);
                        debug!(interval_secs = poll_interval.as_secs(), "Poll interval changed");
                        poll_timer = interval_at(
                            tokio::time::Instant::now() + poll_interval,
                            poll_interval,
                        );
                        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    }
                    Some(PollerCommand::SetThresholds(thresholds)) => {
                        orchestrator.scheduler.set_thresholds(thresholds);
                    }
                    Some(PollerCommand::Shutdown) | None => break,
                }
            }
        }
    }

    if let Some(cycle) = in_flight {
        cycle.abort();
    }
    debug!("Usage poller stopped");
}

/// Runs one complete poll cycle: the fetch wrapped by the connectivity
/// executor, wrapped by the backpressure executor, so a backpressure
/// retry re-runs the whole connectivity-guarded call with a fresh
/// budget. One-shot callers (the `check` command) share this exact
/// chain with the background poller.
///
/// # Errors
///
/// Returns the terminal [`Failure`] once a non-retryable failure occurs
/// or the matching retry budget is spent.
pub async fn poll_once(
    source: Arc<dyn UsageSource>,
    uncached: bool,
) -> Result<UsageSnapshot, Failure> {
    let network = RetryExecutor::network();
    let rate_limit = RetryExecutor::rate_limit();
    rate_limit
        .run(|| {
            let network = network.clone();
            let source = source.clone();
            async move {
                network
                    .run(|| {
                        let source = source.clone();
                        async move {
                            if uncached {
                                source.fetch_usage_uncached().await
                            } else {
                                source.fetch_usage().await
                            }
                        }
                    })
                    .await
            }
        })
        .await
}

fn spawn_poll_cycle(
    source: Arc<dyn UsageSource>,
    uncached: bool,
) -> JoinHandle<Result<UsageSnapshot, Failure>> {
    tokio::spawn(poll_once(source, uncached))
}

/// Awaits the in-flight cycle; pends forever when there is none (the
/// select guard keeps this branch disabled in that case).
async fn join_poll_cycle(
    in_flight: &mut Option<JoinHandle<Result<UsageSnapshot, Failure>>>,
) -> Result<UsageSnapshot, Failure> {
    match in_flight {
        Some(cycle) => match cycle.await {
            Ok(result) => result,
            Err(join_error) => Err(Failure::new(format!("Poll task failed: {join_error}"))),
        },
        None => std::future::pending().await,
    }
}

impl Orchestrator {
    /// Applies one settled poll outcome: publish state first, then
    /// derived notifications.
    async fn settle(&mut self, result: Result<UsageSnapshot, Failure>) {
        match result {
            Ok(snapshot) => {
                let percent = snapshot.utilization_percent;
                self.publish(PollState::Ready(snapshot.clone()));
                self.latest_snapshot = Some(snapshot);
                self.warn_usage_if_crossed(percent).await;
            }
            Err(failure) => {
                let kind = failure.classify();
                let state = match kind {
                    FailureKind::NetworkError => PollState::Offline,
                    FailureKind::RateLimited => PollState::RateLimited,
                    // The raw message stays in the log line below.
                    FailureKind::TokenExpired => PollState::Errored(kind.label().to_string()),
                    FailureKind::Unknown => PollState::Errored(failure.to_string()),
                };
                warn!(kind = kind.label(), error = %failure, "Poll failed");
                self.publish(state);
                self.notify_failure(kind).await;
            }
        }
    }

    /// Marks the start of a poll cycle. Views see `Loading` while the
    /// cycle runs; transition logging waits until it settles.
    fn begin_cycle(&mut self) {
        debug!(from = self.last_settled, "Poll cycle started");
        let _ = self.state_tx.send(PollState::Loading);
    }

    /// Publishes a settled state, logging flips between distinct
    /// settled states (the per-cycle `Loading` never logs a flip).
    fn publish(&mut self, state: PollState) {
        let label = state.label();
        if self.last_settled != label {
            info!(from = self.last_settled, to = label, "Poll state changed");
        }
        self.last_settled = label;
        let _ = self.state_tx.send(state);
    }

    /// Fires a usage warning when the percentage crossed a level since
    /// the last poll. The comparison value updates on every poll, so a
    /// drop below a level re-arms it.
    async fn warn_usage_if_crossed(&mut self, percent: f64) {
        let last = self.last_warned_percent;
        self.last_warned_percent = percent;

        if percent >= CRITICAL_USAGE_PERCENT && last < CRITICAL_USAGE_PERCENT {
            let body = format!(
                "You've used {percent:.1}% of your usage quota. Consider saving your work."
            );
            self.deliver("Critical Usage Alert", &body).await;
        } else if percent >= HIGH_USAGE_PERCENT && last < HIGH_USAGE_PERCENT {
            let body = format!("You've used {percent:.1}% of your usage quota.");
            self.deliver("High Usage Warning", &body).await;
        }
    }

    /// Sends the alert matching a terminal failure kind. Unknown
    /// failures only surface through the published state.
    async fn notify_failure(&mut self, kind: FailureKind) {
        let (title, body) = match kind {
            FailureKind::TokenExpired => (
                "Token Expired",
                "Your authentication token has expired. Please log in again.",
            ),
            FailureKind::NetworkError => (
                "Network Error",
                "Unable to connect to the usage API. Please check your internet connection.",
            ),
            FailureKind::RateLimited => (
                "Rate Limited",
                "Usage API rate limit reached. Please wait before retrying.",
            ),
            FailureKind::Unknown => return,
        };
        self.deliver(title, body).await;
    }

    /// Evaluates reminders against the last known reset deadline.
    async fn reminder_tick(&mut self, now: DateTime<Utc>) {
        let Some(resets_at) = self.latest_snapshot.as_ref().and_then(|s| s.resets_at) else {
            return;
        };

        let fire = self.scheduler.on_tick(now, resets_at, self.snooze_until);
        if fire.on_reset {
            // The cycle ended; any active snooze ends with it.
            self.snooze_until = None;
        }
        if fire.is_quiet() {
            return;
        }

        let percent = self.latest_snapshot.as_ref().map(|s| s.utilization_percent);
        if let Some(reason) = self.focus.suppression_reason(Local::now().hour(), percent) {
            debug!(%reason, "Reminder suppressed");
            return;
        }

        if let Some(threshold) = fire.threshold {
            debug!(
                threshold,
                remaining = fire.remaining_minutes,
                "Reminder threshold crossed"
            );
            let body = format!(
                "Your usage quota will reset in {}.",
                format_minutes(fire.remaining_minutes)
            );
            self.deliver("Reset Soon", &body).await;
        }
        if fire.on_reset {
            self.deliver("Quota Reset", "Your usage quota has reset.").await;
        }
    }

    /// Delivers through the notifier, subject to the global throttle.
    /// The throttle window is only consumed by a successful delivery.
    async fn deliver(&mut self, title: &str, body: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let now = tokio::time::Instant::now().into_std();
        if !self.throttle.can_send(now) {
            debug!(title, "Notification throttled");
            return;
        }
        match notifier.send(title, body).await {
            Ok(()) => self.throttle.record_sent(now),
            Err(error) => warn!(%error, title, "Failed to deliver notification"),
        }
    }
}

/// Renders a minute count the way reminder bodies phrase it.
fn format_minutes(minutes: i64) -> String {
    if minutes < 60 {
        format!("{minutes} minute{}", if minutes == 1 { "" } else { "s" })
    } else {
        let hours = minutes / 60;
        format!("{hours} hour{}", if hours == 1 { "" } else { "s" })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use quotaminder_core::CoreError;

    struct ScriptedSource {
        script: Mutex<VecDeque<Result<UsageSnapshot, Failure>>>,
        calls: AtomicU32,
        uncached_calls: AtomicU32,
    }

    impl ScriptedSource {
        /// The last entry repeats forever once the script runs out.
        fn new(script: Vec<Result<UsageSnapshot, Failure>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                uncached_calls: AtomicU32::new(0),
            })
        }

        fn next_result(&self) -> Result<UsageSnapshot, Failure> {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn uncached_calls(&self) -> u32 {
            self.uncached_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UsageSource for ScriptedSource {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn fetch_usage(&self) -> Result<UsageSnapshot, Failure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.next_result()
        }

        async fn fetch_usage_uncached(&self) -> Result<UsageSnapshot, Failure> {
            self.uncached_calls.fetch_add(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.next_result()
        }
    }

    /// Succeeds after holding the call open for a fixed delay.
    struct DelayedSource {
        delay: Duration,
    }

    #[async_trait]
    impl UsageSource for DelayedSource {
        fn id(&self) -> &str {
            "delayed"
        }

        async fn fetch_usage(&self) -> Result<UsageSnapshot, Failure> {
            tokio::time::sleep(self.delay).await;
            Ok(UsageSnapshot::new(10.0))
        }

        async fn fetch_usage_uncached(&self) -> Result<UsageSnapshot, Failure> {
            self.fetch_usage().await
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn titles(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn id(&self) -> &str {
            "recording"
        }

        async fn send(&self, title: &str, body: &str) -> Result<(), CoreError> {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn ok(percent: f64) -> Result<UsageSnapshot, Failure> {
        Ok(UsageSnapshot::new(percent))
    }

    fn ok_with_reset(percent: f64, resets_in: chrono::Duration) -> Result<UsageSnapshot, Failure> {
        let mut snapshot = UsageSnapshot::new(percent);
        snapshot.resets_at = Some(Utc::now() + resets_in);
        Ok(snapshot)
    }

    fn config(interval_secs: u64) -> PollerConfig {
        PollerConfig::new().with_poll_interval(Duration::from_secs(interval_secs))
    }

    async fn wait_for(state_rx: &mut watch::Receiver<PollState>, label: &str) {
        while state_rx.borrow().label() != label {
            state_rx.changed().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_runs_immediately() {
        let source = ScriptedSource::new(vec![ok(42.0)]);
        let handle = UsagePoller::new(config(60), source.clone()).spawn();

        let mut state_rx = handle.state();
        wait_for(&mut state_rx, "Ready").await;
        match handle.current_state() {
            PollState::Ready(snapshot) => assert_eq!(snapshot.utilization_percent, 42.0),
            other => panic!("unexpected state: {other:?}"),
        }
        assert_eq!(source.calls(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_polls_repeat_on_interval() {
        let source = ScriptedSource::new(vec![ok(10.0)]);
        let handle = UsagePoller::new(config(30), source.clone()).spawn();

        // Polls land at t=0, 30 and 60.
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(source.calls(), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_start_republishes_loading() {
        let source = Arc::new(DelayedSource {
            delay: Duration::from_secs(5),
        });
        let handle = UsagePoller::new(config(30), source).spawn();

        // First cycle is in flight t=0..5, then settles.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(handle.current_state().label(), "Ready");

        // The second cycle begins at t=30 and settles at t=35; while
        // it runs the channel shows Loading again.
        tokio::time::sleep(Duration::from_secs(26)).await;
        assert_eq!(handle.current_state().label(), "Loading");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.current_state().label(), "Ready");
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_after_exhausted_network_retries() {
        let source = ScriptedSource::new(vec![Err(Failure::offline("connection refused"))]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(300), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        let mut state_rx = handle.state();
        wait_for(&mut state_rx, "Offline").await;

        // Initial try plus five retries.
        assert_eq!(source.calls(), 6);
        assert_eq!(notifier.titles(), vec!["Network Error"]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_notifications_are_throttled() {
        let source = ScriptedSource::new(vec![Err(Failure::rate_limited("too many requests"))]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(30), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        // Each cycle is 5 tries over 15 s, terminal at t=15, 45, 75.
        // The t=45 alert falls inside the 60 s window and is dropped.
        tokio::time::sleep(Duration::from_secs(80)).await;
        assert_eq!(source.calls(), 15);
        assert_eq!(notifier.titles(), vec!["Rate Limited", "Rate Limited"]);
        assert_eq!(handle.current_state().label(), "Rate Limited");
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_expired_surfaces_as_errored() {
        let source = ScriptedSource::new(vec![Err(Failure::token_expired("session expired"))]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(300), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        let mut state_rx = handle.state();
        wait_for(&mut state_rx, "Error").await;
        match handle.current_state() {
            PollState::Errored(message) => assert_eq!(message, "token expired"),
            other => panic!("unexpected state: {other:?}"),
        }

        // Fatal per poll: no retries.
        assert_eq!(source.calls(), 1);
        assert_eq!(notifier.titles(), vec!["Token Expired"]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_usage_warning_fires_once_per_crossing() {
        let source = ScriptedSource::new(vec![ok(70.0), ok(92.0), ok(93.0)]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(30), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        tokio::time::sleep(Duration::from_secs(100)).await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Critical Usage Alert");
        assert!(sent[0].1.contains("92.0%"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_usage_warning_fires_at_each_level_crossing() {
        let source = ScriptedSource::new(vec![
            ok(40.0),
            ok(55.0),
            ok(80.0),
            ok(95.0),
            ok(40.0),
        ]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(300), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        // Polls at t=0, 300, 600, 900 and 1200. Each level crossing
        // warns once; the final decrease warns nothing.
        tokio::time::sleep(Duration::from_secs(1210)).await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "High Usage Warning");
        assert!(sent[0].1.contains("80.0%"));
        assert_eq!(sent[1].0, "Critical Usage Alert");
        assert!(sent[1].1.contains("95.0%"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_bypasses_cache_and_resets_phase() {
        let source = ScriptedSource::new(vec![ok(10.0)]);
        let handle = UsagePoller::new(config(300), source.clone()).spawn();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls(), 1);

        handle.refresh().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(source.uncached_calls(), 1);

        // The schedule was re-phased by the refresh at t=5: nothing at
        // t=300, the next scheduled poll lands at t=305.
        tokio::time::sleep(Duration::from_secs(296)).await;
        assert_eq!(source.calls(), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(source.uncached_calls(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_threshold_delivers_reset_soon() {
        let source = ScriptedSource::new(vec![ok_with_reset(
            10.0,
            chrono::Duration::seconds(330),
        )]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(60), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        // Reminder ticks at t=30 and t=60 both read 5 minutes left;
        // only the first fires.
        tokio::time::sleep(Duration::from_secs(65)).await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Reset Soon");
        assert_eq!(sent[0].1, "Your usage quota will reset in 5 minutes.");
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_passing_delivers_quota_reset_once() {
        let source = ScriptedSource::new(vec![ok_with_reset(
            10.0,
            chrono::Duration::seconds(10),
        )]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(300), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        tokio::time::sleep(Duration::from_secs(95)).await;

        assert_eq!(notifier.titles(), vec!["Quota Reset"]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_snooze_defers_reminders_until_cancelled() {
        let source = ScriptedSource::new(vec![ok_with_reset(
            10.0,
            chrono::Duration::seconds(330),
        )]);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = UsagePoller::new(config(300), source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.snooze(10).await.unwrap();

        // Ticks at t=30 and t=60 are snoozed and consume nothing.
        tokio::time::sleep(Duration::from_secs(64)).await;
        assert!(notifier.titles().is_empty());

        // Lifting the snooze lets the still-in-range threshold fire.
        handle.cancel_snooze().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(notifier.titles(), vec!["Reset Soon"]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dnd_suppresses_reminders_only() {
        let source = ScriptedSource::new(vec![ok_with_reset(
            60.0,
            chrono::Duration::seconds(330),
        )]);
        let notifier = Arc::new(RecordingNotifier::default());
        let poller_config =
            config(300).with_focus_gate(FocusGate::new().with_dnd_above(50.0));
        let handle = UsagePoller::new(poller_config, source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        // The 5-minute threshold would fire at t=30, but utilization
        // sits above the do-not-disturb level.
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert!(notifier.titles().is_empty());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_usage_warning_bypasses_dnd() {
        // One shared deadline keeps the reminder cycle stable across
        // both snapshots.
        let resets_at = Some(Utc::now() + chrono::Duration::seconds(330));
        let mut low = UsageSnapshot::new(40.0);
        low.resets_at = resets_at;
        let mut high = UsageSnapshot::new(95.0);
        high.resets_at = resets_at;
        let source = ScriptedSource::new(vec![Ok(low), Ok(high)]);
        let notifier = Arc::new(RecordingNotifier::default());
        let poller_config =
            config(300).with_focus_gate(FocusGate::new().with_dnd_above(50.0));
        let handle = UsagePoller::new(poller_config, source.clone())
            .with_notifier(notifier.clone())
            .spawn();

        // At t=30 utilization is 40 and the reminder passes the gate.
        // The t=300 poll jumps to 95: do-not-disturb now holds for
        // reminders, yet the critical alert still fires.
        tokio::time::sleep(Duration::from_secs(310)).await;

        assert_eq!(
            notifier.titles(),
            vec!["Reset Soon", "Critical Usage Alert"]
        );
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_runs_stacked_budgets() {
        // A backpressure failure after a connectivity failure shows the
        // outer executor restarting the inner one with a fresh budget.
        let source = ScriptedSource::new(vec![
            Err(Failure::rate_limited("too many requests")),
            Err(Failure::offline("connection refused")),
            ok(42.0),
        ]);

        let started = tokio::time::Instant::now();
        let snapshot = poll_once(source.clone(), false).await.unwrap();

        assert_eq!(snapshot.utilization_percent, 42.0);
        assert_eq!(source.calls(), 3);
        // 1000ms backpressure delay plus 2000ms connectivity delay.
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_uncached_bypasses_cache() {
        let source = ScriptedSource::new(vec![ok(10.0)]);
        poll_once(source.clone(), true).await.unwrap();
        assert_eq!(source.uncached_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling() {
        let source = ScriptedSource::new(vec![ok(10.0)]);
        let handle = UsagePoller::new(config(30), source.clone()).spawn();

        let mut state_rx = handle.state();
        wait_for(&mut state_rx, "Ready").await;
        handle.shutdown().await;

        let calls_after_shutdown = source.calls();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.calls(), calls_after_shutdown);
    }

    #[test]
    fn test_format_minutes_phrasing() {
        assert_eq!(format_minutes(1), "1 minute");
        assert_eq!(format_minutes(5), "5 minutes");
        assert_eq!(format_minutes(59), "59 minutes");
        assert_eq!(format_minutes(60), "1 hour");
        assert_eq!(format_minutes(120), "2 hours");
    }
}
