//! The polling loop.
//!
//! [`Poller::run`] polls once immediately, then once per interval until its
//! [`CancellationToken`] fires. A cycle that has started always runs to
//! completion; cancellation only prevents the next one.
//!
//! Each cycle is fetch → decode → detect → append → notify. Detection runs
//! before the append so that a malformed timestamp or window aborts the
//! cycle without touching the history.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use utoipa::ToSchema;

use super::fetcher::ItemSource;
use super::notifier::{Notifier, spawn_notification};
use crate::config::WatcherConfig;
use crate::domain::{DetectionWindow, HistoryStore, detect};
use crate::error::PollError;

/// Scheduling and detection settings for a [`Poller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerSettings {
    /// Time between cycles.
    pub interval: Duration,
    /// Window lower bound, parsed every cycle.
    pub window_start: String,
    /// Window upper bound, parsed every cycle.
    pub window_end: String,
    /// Upper bound on one notification.
    pub notify_timeout: Duration,
}

impl From<&WatcherConfig> for PollerSettings {
    fn from(config: &WatcherConfig) -> Self {
        Self {
            interval: config.poll_interval,
            window_start: config.window_start.clone(),
            window_end: config.window_end.clone(),
            notify_timeout: config.notify.timeout,
        }
    }
}

/// Running totals maintained by the poller.
#[derive(Debug, Default)]
pub struct PollStats {
    cycles: AtomicU64,
    failures: AtomicU64,
    hits: AtomicU64,
}

/// Point-in-time copy of [`PollStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PollStatsSnapshot {
    /// Cycles started.
    pub cycles: u64,
    /// Cycles abandoned because of an error.
    pub failures: u64,
    /// Cycles that triggered a notification.
    pub hits: u64,
}

impl PollStats {
    /// Reads all counters.
    #[must_use]
    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

/// Summary of a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Items received and stored.
    pub items: usize,
    /// Items that qualified.
    pub matches: usize,
}

impl CycleReport {
    /// Returns `true` if the cycle triggered a notification.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        self.matches > 0
    }
}

/// Periodic fetch/detect/notify worker. The only writer of the
/// [`HistoryStore`].
#[derive(Debug)]
pub struct Poller<S> {
    source: S,
    store: Arc<HistoryStore>,
    notifier: Arc<dyn Notifier>,
    settings: PollerSettings,
    stats: Arc<PollStats>,
}

impl<S: ItemSource> Poller<S> {
    /// Creates a poller writing into `store`.
    #[must_use]
    pub fn new(
        source: S,
        store: Arc<HistoryStore>,
        notifier: Arc<dyn Notifier>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            settings,
            stats: Arc::new(PollStats::default()),
        }
    }

    /// Shared handle to this poller's counters.
    #[must_use]
    pub fn stats(&self) -> Arc<PollStats> {
        Arc::clone(&self.stats)
    }

    /// Polls immediately, then every interval, until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval = ?self.settings.interval, "poller started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            // Not raced against `cancel`: a started cycle always finishes.
            let _ = self.poll_once().await;
        }
        tracing::info!("poller stopped");
    }

    /// Runs a single cycle, logging and counting its outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`PollError`] that aborted the cycle. The history store
    /// is unchanged in that case.
    pub async fn poll_once(&self) -> Result<CycleReport, PollError> {
        let cycle = self
            .stats
            .cycles
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1);
        let span = tracing::info_span!("poll_cycle", cycle);

        async {
            tracing::debug!("cycle started");
            let result = self.cycle().await;
            match &result {
                Ok(report) => {
                    tracing::info!(items = report.items, matches = report.matches, "cycle finished");
                }
                Err(e) => {
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(error = %e, "cycle failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn cycle(&self) -> Result<CycleReport, PollError> {
        let items = self.source.fetch().await?;

        let window =
            DetectionWindow::parse(&self.settings.window_start, &self.settings.window_end)?;
        let detection = detect(&items, &window)?;
        for item in detection.matches() {
            tracing::info!(
                departure_time = %item.departure_time,
                count = %item.count,
                price = %item.price,
                "item found"
            );
        }

        let report = CycleReport {
            items: items.len(),
            matches: detection.matches().len(),
        };
        self.store.append(items);

        if detection.is_hit() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            // Detached: the next tick never waits on the sink.
            drop(spawn_notification(
                Arc::clone(&self.notifier),
                self.settings.notify_timeout,
            ));
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::domain::{Count, Item};
    use crate::error::NotifyError;

    /// Replays scripted fetch results, then returns empty lists.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<Item>, PollError>>>,
        calls: AtomicUsize,
        delay: Duration,
        started: Notify,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<Item>, PollError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ItemSource for Arc<ScriptedSource> {
        async fn fetch(&self) -> Result<Vec<Item>, PollError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = match self.script.lock() {
                Ok(mut script) => script.pop_front(),
                Err(_) => None,
            };
            next.unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        calls: AtomicUsize,
        fail: bool,
        notified: Notify,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.notified.notify_one();
            if self.fail {
                Err(NotifyError::EmptyCommand)
            } else {
                Ok(())
            }
        }
    }

    fn settings(interval: Duration) -> PollerSettings {
        PollerSettings {
            interval,
            window_start: "2025-01-01 10:00:00".to_string(),
            window_end: "2025-01-01 12:00:00".to_string(),
            notify_timeout: Duration::from_secs(1),
        }
    }

    fn in_window(count: i64) -> Item {
        Item::new("2025-01-01 11:00:00", Count::number(count), "20.00")
    }

    fn poller(
        source: &Arc<ScriptedSource>,
        notifier: &Arc<RecordingNotifier>,
        interval: Duration,
    ) -> (Poller<Arc<ScriptedSource>>, Arc<HistoryStore>) {
        let store = Arc::new(HistoryStore::new());
        let notifier: Arc<dyn Notifier> = Arc::clone(notifier) as Arc<dyn Notifier>;
        let poller = Poller::new(
            Arc::clone(source),
            Arc::clone(&store),
            notifier,
            settings(interval),
        );
        (poller, store)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "condition not reached in time");
    }

    #[tokio::test]
    async fn hit_notifies_once_regardless_of_match_count() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![
            in_window(1),
            in_window(2),
            in_window(3),
        ])]));
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_secs(60));

        let report = tokio_test::assert_ok!(poller.poll_once().await);
        assert_eq!(report.matches, 3);
        assert!(report.is_hit());

        let notified = tokio::time::timeout(Duration::from_secs(5), notifier.notified.notified());
        assert!(notified.await.is_ok());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(poller.stats().snapshot().hits, 1);
    }

    #[tokio::test]
    async fn miss_is_stored_without_notification() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![
            in_window(0),
            Item::new("2025-01-01 09:00:00", Count::number(4), "20.00"),
        ])]));
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_secs(60));

        let report = tokio_test::assert_ok!(poller.poll_once().await);
        assert!(!report.is_hit());
        assert_eq!(report.items, 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.list_all().len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_history_unchanged() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![in_window(0)]),
            Err(PollError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_secs(60));

        tokio_test::assert_ok!(poller.poll_once().await);
        let before = store.list_all();

        tokio_test::assert_err!(poller.poll_once().await);
        assert_eq!(store.list_all(), before);

        let stats = poller.stats().snapshot();
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test]
    async fn malformed_departure_leaves_history_unchanged() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![
            in_window(5),
            Item::new("2025/01/01 11:00", Count::number(5), ""),
        ])]));
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_secs(60));

        let result = poller.poll_once().await;
        assert!(matches!(result, Err(PollError::InvalidTimestamp { .. })));
        assert!(store.is_empty());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_window_fails_the_cycle() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![in_window(5)])]));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(HistoryStore::new());
        let mut bad = settings(Duration::from_secs(60));
        bad.window_end = "noon".to_string();
        let poller = Poller::new(
            Arc::clone(&source),
            Arc::clone(&store),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            bad,
        );

        tokio_test::assert_err!(poller.poll_once().await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn run_polls_eagerly_and_stops_on_cancel() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_secs(3600));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poller.run(cancel.clone()));

        wait_until(|| store.len() == 1).await;
        cancel.cancel();

        let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn run_keeps_polling_after_failures() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(PollError::Status(reqwest::StatusCode::BAD_GATEWAY)),
            Err(PollError::InvalidUrl("x".to_string())),
            Ok(vec![in_window(0)]),
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_millis(10));
        let stats = poller.stats();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poller.run(cancel.clone()));

        wait_until(|| store.len() >= 2).await;
        cancel.cancel();
        assert!(tokio::time::timeout(Duration::from_secs(5), handle).await.is_ok());

        assert_eq!(stats.snapshot().failures, 2);
    }

    #[tokio::test]
    async fn sink_failures_do_not_stop_the_loop() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![in_window(1)]),
            Ok(vec![in_window(1)]),
            Ok(vec![in_window(1)]),
        ]));
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let (poller, store) = poller(&source, &notifier, Duration::from_millis(10));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poller.run(cancel.clone()));

        wait_until(|| store.len() >= 4).await;
        cancel.cancel();
        assert!(tokio::time::timeout(Duration::from_secs(5), handle).await.is_ok());
        assert!(notifier.calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn cancellation_lets_the_running_cycle_finish() {
        let source = Arc::new(ScriptedSource {
            delay: Duration::from_millis(200),
            ..ScriptedSource::new(vec![Ok(vec![in_window(0)])])
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_secs(3600));

        let cancel = CancellationToken::new();
        let started = source.started.notified();
        let handle = tokio::spawn(poller.run(cancel.clone()));

        assert!(
            tokio::time::timeout(Duration::from_secs(5), started)
                .await
                .is_ok()
        );
        cancel.cancel();

        let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
        assert_eq!(store.len(), 1);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_token_never_polls() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let notifier = Arc::new(RecordingNotifier::default());
        let (poller, store) = poller(&source, &notifier, Duration::from_secs(3600));

        let cancel = CancellationToken::new();
        cancel.cancel();
        poller.run(cancel).await;

        assert_eq!(source.calls(), 0);
        assert!(store.is_empty());
    }
}
