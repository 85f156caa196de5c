//! Snapshot Poller
//!
//! One background task per open tender view. It fetches a snapshot right
//! away, then on every tick while the pipeline is unsettled. Once a settled
//! snapshot arrives the loop parks until `refresh_now` wakes it.
//!
//! A submitted re-run often is not visible in the very next snapshot, so
//! `refresh_and_hold` keeps the loop ticking for a while even through settled
//! snapshots.
//!
//! All fetches happen inside the single loop task, so at most one request is
//! outstanding per tender. Ticks that fall due during a fetch are skipped and
//! refresh requests coalesce into one pending wake-up.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tender_monitor_core::{AnalysisBackend, MonitorError, Snapshot, TenderId};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::settings::PollSettings;

/// Receives poll outcomes in the order they were fetched.
#[async_trait]
pub trait SnapshotObserver: Send + Sync {
    /// A valid snapshot was received.
    async fn on_snapshot(&self, snapshot: Snapshot);

    /// A poll failed. The poller keeps its cadence regardless.
    async fn on_poll_error(&self, error: MonitorError);
}

/// What woke the loop up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Tick,
    Refresh,
}

/// Entry point for starting poll loops.
pub struct SnapshotPoller;

impl SnapshotPoller {
    /// Spawn the poll loop for one tender.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        tender_id: TenderId,
        backend: Arc<dyn AnalysisBackend>,
        observer: Arc<dyn SnapshotObserver>,
        settings: PollSettings,
    ) -> PollerHandle {
        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());
        let (hold, hold_rx) = watch::channel(None);

        let task = tokio::spawn(Self::run(
            tender_id,
            backend,
            observer,
            settings,
            cancel.clone(),
            refresh.clone(),
            hold_rx,
        ));

        PollerHandle {
            cancel,
            refresh,
            hold,
            task: Some(task),
        }
    }

    async fn run(
        tender_id: TenderId,
        backend: Arc<dyn AnalysisBackend>,
        observer: Arc<dyn SnapshotObserver>,
        settings: PollSettings,
        cancel: CancellationToken,
        refresh: Arc<Notify>,
        hold: watch::Receiver<Option<Instant>>,
    ) {
        let mut ticker = interval(settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let timeout_secs = settings.request_timeout.as_secs().max(1);
        let mut settled = false;

        tracing::debug!(
            tender_id = %tender_id,
            interval_ms = settings.interval.as_millis() as u64,
            "snapshot poller started"
        );

        loop {
            let wake = if settled && !Self::is_held(&hold) {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = refresh.notified() => Wake::Refresh,
                }
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => Wake::Tick,
                    _ = refresh.notified() => Wake::Refresh,
                }
            };

            // Out-of-band fetches restart the cadence from now.
            if wake == Wake::Refresh {
                ticker.reset();
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = timeout(settings.request_timeout, backend.snapshot(&tender_id)) => result,
            };

            if cancel.is_cancelled() {
                break;
            }

            match outcome {
                Ok(Ok(snapshot)) => {
                    settled = snapshot.is_settled();
                    if settled && !Self::is_held(&hold) {
                        tracing::debug!(tender_id = %tender_id, "pipeline settled, poller parked");
                    }
                    observer.on_snapshot(snapshot).await;
                }
                Ok(Err(error)) => {
                    settled = false;
                    tracing::warn!(tender_id = %tender_id, error = %error, "snapshot poll failed");
                    observer.on_poll_error(error).await;
                }
                Err(_) => {
                    settled = false;
                    tracing::warn!(tender_id = %tender_id, timeout_secs, "snapshot poll timed out");
                    observer.on_poll_error(MonitorError::Timeout(timeout_secs)).await;
                }
            }
        }

        tracing::debug!(tender_id = %tender_id, "snapshot poller stopped");
    }

    fn is_held(hold: &watch::Receiver<Option<Instant>>) -> bool {
        hold.borrow().is_some_and(|until| Instant::now() < until)
    }
}

/// Owned handle to a running poll loop. Dropping it stops the loop.
pub struct PollerHandle {
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    /// Poll through settled snapshots until this instant
    hold: watch::Sender<Option<Instant>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop polling. Safe to call any number of times.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Fetch a snapshot as soon as the current fetch (if any) completes.
    ///
    /// Wakes a parked loop. Repeated calls before the fetch starts collapse
    /// into one.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// `refresh_now`, then keep ticking for `hold` even while settled.
    ///
    /// Overlapping holds extend to the latest deadline.
    pub fn refresh_and_hold(&self, hold: Duration) {
        let until = Instant::now() + hold;
        self.hold.send_modify(|current| {
            if !matches!(*current, Some(existing) if existing >= until) {
                *current = Some(until);
            }
        });
        self.refresh.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop and wait for the loop task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "snapshot poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
