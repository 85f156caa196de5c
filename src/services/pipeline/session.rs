//! Tender Monitor Session
//!
//! `TenderMonitor` is what a tender view holds while it is open. It owns the
//! poller, the pipeline state and the detail cache, and shares the
//! reanalysis coordinator with every other view.
//!
//! Updates are published through a `watch` channel: subscribers always see
//! the latest state and never a backlog.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tender_monitor_core::{
    select_tab, Acknowledgement, AnalysisBackend, MonitorError, MonitorResult, SectionAccess,
    SectionId, Snapshot, TenderId,
};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::cache::SectionDetailCache;
use super::poller::{PollerHandle, SnapshotObserver, SnapshotPoller};
use super::reanalysis::{ReanalysisCoordinator, ReanalysisTarget};
use super::state::PipelineState;
use crate::models::monitor::{MonitorUpdate, PipelineOverview, SectionDetail};
use crate::models::settings::SessionSettings;

/// Shared between the session and its poll loop.
struct SessionInner {
    session_id: String,
    tender_id: TenderId,
    state: RwLock<PipelineState>,
    updates: watch::Sender<MonitorUpdate>,
    cache: SectionDetailCache,
    current_tab: RwLock<Option<SectionId>>,
    closed: CancellationToken,
}

impl SessionInner {
    fn publish(&self, update: MonitorUpdate) {
        tracing::debug!(
            session_id = %self.session_id,
            tender_id = %self.tender_id,
            generation = update.generation,
            "publishing monitor update"
        );
        self.updates.send_replace(update);
    }
}

#[async_trait]
impl SnapshotObserver for SessionInner {
    async fn on_snapshot(&self, snapshot: Snapshot) {
        let mut state = self.state.write().await;
        let changed = state.changed_sections(&snapshot);
        if state.apply_snapshot(snapshot) {
            for section in changed {
                self.cache.invalidate(section);
            }
            self.publish(state.update());
        }
    }

    async fn on_poll_error(&self, error: MonitorError) {
        let mut state = self.state.write().await;
        if state.record_error(&error) {
            if matches!(error, MonitorError::MalformedSnapshot(_)) {
                tracing::warn!(
                    session_id = %self.session_id,
                    tender_id = %self.tender_id,
                    error = %error,
                    "discarding malformed snapshot"
                );
            }
            self.publish(state.update());
        }
    }
}

/// Borrowed view of a session handed to the coordinator.
struct SessionTarget<'a> {
    inner: &'a SessionInner,
    poller: &'a PollerHandle,
    rerun_hold: Duration,
}

#[async_trait]
impl ReanalysisTarget for SessionTarget<'_> {
    fn tender_id(&self) -> &TenderId {
        &self.inner.tender_id
    }

    async fn mark_analyzing(&self, section: SectionId) {
        let mut state = self.inner.state.write().await;
        if state.is_closed() {
            return;
        }
        state.mark_analyzing(section);
        self.inner.publish(state.update());
    }

    async fn is_busy(&self) -> bool {
        self.inner.state.read().await.is_busy()
    }

    fn invalidate_detail(&self, section: SectionId) {
        self.inner.cache.invalidate(section);
    }

    fn invalidate_all_details(&self) {
        self.inner.cache.invalidate_all();
    }

    fn follow_rerun(&self) {
        self.poller.refresh_and_hold(self.rerun_hold);
    }
}

/// An open tender view.
pub struct TenderMonitor {
    inner: Arc<SessionInner>,
    poller: PollerHandle,
    coordinator: Arc<ReanalysisCoordinator>,
    /// How long to keep polling after a submitted re-run
    rerun_hold: Duration,
}

impl TenderMonitor {
    /// Start monitoring `tender_id`. The first snapshot is requested at once.
    pub fn open(
        tender_id: TenderId,
        backend: Arc<dyn AnalysisBackend>,
        coordinator: Arc<ReanalysisCoordinator>,
        settings: SessionSettings,
    ) -> MonitorResult<Self> {
        if tender_id.is_blank() {
            return Err(MonitorError::validation("tender id must not be empty"));
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let (updates, _) = watch::channel(MonitorUpdate::pending(tender_id.clone()));

        let inner = Arc::new(SessionInner {
            session_id: session_id.clone(),
            tender_id: tender_id.clone(),
            state: RwLock::new(PipelineState::new(tender_id.clone(), settings.overlay_ttl)),
            updates,
            cache: SectionDetailCache::new(tender_id.clone(), backend.clone(), settings.cache),
            current_tab: RwLock::new(None),
            closed: CancellationToken::new(),
        });

        let poller = SnapshotPoller::start(tender_id.clone(), backend, inner.clone(), settings.poll);

        tracing::info!(session_id = %session_id, tender_id = %tender_id, "tender view opened");

        Ok(Self {
            inner,
            poller,
            coordinator,
            rerun_hold: settings.overlay_ttl,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn tender_id(&self) -> &TenderId {
        &self.inner.tender_id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Receiver that always holds the latest update.
    pub fn subscribe(&self) -> watch::Receiver<MonitorUpdate> {
        self.inner.updates.subscribe()
    }

    /// Forward every update to `callback` until the session closes.
    ///
    /// The current state is delivered first.
    pub fn subscribe_with<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(MonitorUpdate) + Send + Sync + 'static,
    {
        let mut rx = self.subscribe();
        let closed = self.inner.closed.clone();

        tokio::spawn(async move {
            callback(rx.borrow_and_update().clone());
            loop {
                tokio::select! {
                    _ = closed.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        callback(rx.borrow_and_update().clone());
                    }
                }
            }
        })
    }

    pub async fn section_access(&self, section: SectionId) -> SectionAccess {
        self.inner.state.read().await.section_access(section)
    }

    /// Switch tabs. A locked tab leaves the current one selected.
    pub async fn select_tab(&self, section: SectionId) -> Option<SectionId> {
        let access = self.section_access(section).await;
        let mut current = self.inner.current_tab.write().await;
        *current = select_tab(*current, &access);
        *current
    }

    pub async fn current_tab(&self) -> Option<SectionId> {
        *self.inner.current_tab.read().await
    }

    pub async fn overview(&self) -> PipelineOverview {
        let in_flight = self
            .coordinator
            .in_flight(&self.inner.tender_id)
            .and_then(|request| request.section);
        self.inner.state.read().await.overview(in_flight)
    }

    /// Detail of an enterable section, from cache when fresh.
    pub async fn fetch_section_detail(&self, section: SectionId) -> MonitorResult<SectionDetail> {
        self.ensure_open()?;
        let access = self.section_access(section).await;
        if !access.enterable {
            return Err(MonitorError::SectionLocked {
                section,
                status: access.status,
            });
        }
        self.inner.cache.get_or_fetch(section).await
    }

    pub async fn request_reanalysis(&self, section: SectionId) -> MonitorResult<Acknowledgement> {
        self.ensure_open()?;
        self.coordinator.reanalyze(&self.target(), section).await
    }

    pub async fn trigger_full_analysis(&self) -> MonitorResult<Acknowledgement> {
        self.ensure_open()?;
        self.coordinator.trigger_full_analysis(&self.target()).await
    }

    /// Fetch a snapshot now instead of waiting for the next tick.
    pub fn refresh_now(&self) {
        if !self.is_closed() {
            self.poller.refresh_now();
        }
    }

    /// Stop polling and discard the state. Idempotent.
    pub async fn close(&self) {
        self.poller.stop();
        let mut state = self.inner.state.write().await;
        if state.is_closed() {
            return;
        }
        state.close();
        self.inner.closed.cancel();
        self.inner.cache.invalidate_all();
        tracing::info!(
            session_id = %self.inner.session_id,
            tender_id = %self.inner.tender_id,
            "tender view closed"
        );
    }

    fn target(&self) -> SessionTarget<'_> {
        SessionTarget {
            inner: &self.inner,
            poller: &self.poller,
            rerun_hold: self.rerun_hold,
        }
    }

    fn ensure_open(&self) -> MonitorResult<()> {
        if self.is_closed() {
            Err(MonitorError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

impl Drop for TenderMonitor {
    fn drop(&mut self) {
        self.inner.closed.cancel();
    }
}
