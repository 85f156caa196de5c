//! Reanalysis Coordinator
//!
//! Submits section reanalysis and full-pipeline runs. At most one such
//! request is outstanding per tender, across every view of that tender. The
//! slot is taken before any network call and released when the call
//! settles, whichever way it settles.
//!
//! Submission is only half the story: the service acknowledges and returns,
//! and the outcome shows up in a later snapshot. This module never writes a
//! terminal status itself.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tender_monitor_core::{
    Acknowledgement, AnalysisBackend, ConflictReason, MonitorError, MonitorResult, SectionId,
    TenderId,
};
use tokio::time::{timeout, Instant};

use crate::models::settings::CoordinatorSettings;

/// The view-side effects of a submitted request.
#[async_trait]
pub trait ReanalysisTarget: Send + Sync {
    fn tender_id(&self) -> &TenderId;

    /// Show the section as analyzing before the service confirms it.
    async fn mark_analyzing(&self, section: SectionId);

    /// Whether a stage or section is analyzing right now.
    async fn is_busy(&self) -> bool;

    fn invalidate_detail(&self, section: SectionId);

    fn invalidate_all_details(&self);

    /// Ask for a snapshot out of band and keep polling for a while, even if
    /// that snapshot does not show the re-run yet.
    fn follow_rerun(&self);
}

/// An outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlightRequest {
    /// `None` for a full-pipeline run
    pub section: Option<SectionId>,
    pub started: Instant,
}

/// Releases the tender's slot when dropped.
struct SlotGuard<'a> {
    slots: &'a DashMap<TenderId, InFlightRequest>,
    tender_id: TenderId,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slots.remove(&self.tender_id);
    }
}

pub struct ReanalysisCoordinator {
    backend: Arc<dyn AnalysisBackend>,
    settings: CoordinatorSettings,
    slots: Arc<DashMap<TenderId, InFlightRequest>>,
}

impl ReanalysisCoordinator {
    pub fn new(backend: Arc<dyn AnalysisBackend>, settings: CoordinatorSettings) -> Self {
        Self {
            backend,
            settings,
            slots: Arc::new(DashMap::new()),
        }
    }

    /// Coordinator for a new backend that shares this one's in-flight slots.
    ///
    /// Requests still outstanding through `self` keep blocking their tender.
    pub fn rebind(&self, backend: Arc<dyn AnalysisBackend>, settings: CoordinatorSettings) -> Self {
        Self {
            backend,
            settings,
            slots: self.slots.clone(),
        }
    }

    /// Outstanding request for `tender_id`, if any.
    pub fn in_flight(&self, tender_id: &TenderId) -> Option<InFlightRequest> {
        self.slots.get(tender_id).map(|slot| *slot)
    }

    /// Re-run one section.
    ///
    /// Excluded and unknown sections, and a tender with a request already
    /// outstanding, are refused without contacting the service. On failure
    /// the optimistic marker stays until the next snapshot supersedes it.
    pub async fn reanalyze(
        &self,
        target: &dyn ReanalysisTarget,
        section: SectionId,
    ) -> MonitorResult<Acknowledgement> {
        let tender_id = target.tender_id();
        let Some(remote_name) = section.remote_name() else {
            return Err(MonitorError::conflict(ConflictReason::UnknownSection(
                section.tab_key().to_string(),
            )));
        };
        if !section.is_reanalyzable() {
            return Err(MonitorError::conflict(ConflictReason::ExcludedSection(section)));
        }

        let _slot = self.acquire(tender_id, Some(section))?;
        target.mark_analyzing(section).await;

        tracing::info!(tender_id = %tender_id, section = %section, "submitting section reanalysis");
        let result = self
            .bounded(self.backend.reanalyze_section(tender_id, remote_name))
            .await;

        match result {
            Ok(ack) => {
                target.invalidate_detail(section);
                target.follow_rerun();
                tracing::info!(
                    tender_id = %tender_id,
                    section = %section,
                    message = ack.message.as_deref().unwrap_or(""),
                    "section reanalysis accepted"
                );
                Ok(ack)
            }
            Err(error) => {
                tracing::warn!(
                    tender_id = %tender_id,
                    section = %section,
                    error = %error,
                    "section reanalysis failed"
                );
                Err(error)
            }
        }
    }

    /// Start the whole pipeline again.
    ///
    /// Refused while anything is analyzing or another request is outstanding.
    pub async fn trigger_full_analysis(
        &self,
        target: &dyn ReanalysisTarget,
    ) -> MonitorResult<Acknowledgement> {
        let tender_id = target.tender_id();
        let _slot = self.acquire(tender_id, None)?;
        if target.is_busy().await {
            return Err(MonitorError::conflict(ConflictReason::PipelineBusy));
        }

        tracing::info!(tender_id = %tender_id, "submitting full analysis run");
        let ack = self
            .bounded(self.backend.trigger_full_analysis(tender_id))
            .await
            .inspect_err(|error| {
                tracing::warn!(tender_id = %tender_id, error = %error, "full analysis trigger failed");
            })?;

        target.invalidate_all_details();
        target.follow_rerun();
        Ok(ack)
    }

    fn acquire(&self, tender_id: &TenderId, section: Option<SectionId>) -> MonitorResult<SlotGuard<'_>> {
        match self.slots.entry(tender_id.clone()) {
            Entry::Occupied(existing) => {
                let outstanding = existing.get().section;
                tracing::debug!(
                    tender_id = %tender_id,
                    outstanding = ?outstanding,
                    "request refused, another one is in flight"
                );
                Err(MonitorError::conflict(ConflictReason::InFlight {
                    section: outstanding,
                }))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(InFlightRequest {
                    section,
                    started: Instant::now(),
                });
                Ok(SlotGuard {
                    slots: &self.slots,
                    tender_id: tender_id.clone(),
                })
            }
        }
    }

    async fn bounded<F>(&self, request: F) -> MonitorResult<Acknowledgement>
    where
        F: std::future::Future<Output = MonitorResult<Acknowledgement>>,
    {
        let timeout_secs = self.settings.request_timeout.as_secs().max(1);
        timeout(self.settings.request_timeout, request)
            .await
            .map_err(|_| MonitorError::Timeout(timeout_secs))?
    }
}
