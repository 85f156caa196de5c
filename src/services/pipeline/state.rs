//! Pipeline State
//!
//! The per-tender aggregate: the last applied snapshot, a generation
//! counter, the optimistic overlay and the last poll error. Every read the
//! dashboard makes about a section goes through here, so the stage gate and
//! the overlay are applied in exactly one place.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tender_monitor_core::{
    can_enter, section_work_visible, AnalysisStatus, MonitorError, PipelinePhase, SectionAccess,
    SectionId, Snapshot, Stage, TenderId,
};

use super::overlay::OptimisticOverlay;
use crate::models::monitor::{MonitorUpdate, PipelineOverview};

#[derive(Debug)]
pub struct PipelineState {
    tender_id: TenderId,
    snapshot: Option<Snapshot>,
    generation: u64,
    last_error: Option<String>,
    observed_at: Option<DateTime<Utc>>,
    overlay: OptimisticOverlay,
    closed: bool,
}

impl PipelineState {
    pub fn new(tender_id: TenderId, overlay_ttl: Duration) -> Self {
        Self {
            tender_id,
            snapshot: None,
            generation: 0,
            last_error: None,
            observed_at: None,
            overlay: OptimisticOverlay::new(overlay_ttl),
            closed: false,
        }
    }

    pub fn tender_id(&self) -> &TenderId {
        &self.tender_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Replace the snapshot wholesale. Returns false once closed.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> bool {
        if self.closed {
            return false;
        }

        if snapshot.has_stage_inconsistency() {
            tracing::warn!(
                tender_id = %self.tender_id,
                segmentation = %snapshot.segmentation,
                categorization = %snapshot.categorization,
                "categorization reported before segmentation succeeded, ignoring it"
            );
        }

        self.generation += 1;
        self.snapshot = Some(snapshot);
        self.last_error = None;
        self.observed_at = Some(Utc::now());
        self.overlay.prune(self.generation);
        true
    }

    /// Sections whose reported status differs between the current snapshot
    /// and `next`, stage gate applied and overlay ignored.
    ///
    /// A section that changed status may have been re-run, so any detail
    /// fetched for it before is outdated.
    pub fn changed_sections(&self, next: &Snapshot) -> Vec<SectionId> {
        SectionId::all()
            .filter(|section| {
                reported_status(self.snapshot.as_ref(), *section)
                    != reported_status(Some(next), *section)
            })
            .collect()
    }

    /// Record a failed poll. Returns false once closed.
    ///
    /// Transport failures keep the last good snapshot. A malformed snapshot
    /// is never partially trusted, so it drops back to "no data yet".
    pub fn record_error(&mut self, error: &MonitorError) -> bool {
        if self.closed {
            return false;
        }
        if matches!(error, MonitorError::MalformedSnapshot(_)) {
            self.clear();
        }
        self.last_error = Some(error.to_string());
        true
    }

    /// Forget the snapshot and any optimistic markers.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.snapshot = None;
        self.observed_at = None;
        self.overlay.clear();
    }

    /// Stop accepting updates. Late poll results are dropped after this.
    pub fn close(&mut self) {
        self.closed = true;
        self.overlay.clear();
    }

    /// Show `section` as analyzing until a newer snapshot arrives.
    pub fn mark_analyzing(&mut self, section: SectionId) {
        if !self.closed {
            self.overlay.mark_analyzing(section, self.generation);
        }
    }

    pub fn section_work_visible(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|snapshot| {
            section_work_visible(
                snapshot.effective_stage(Stage::Segmentation),
                snapshot.effective_stage(Stage::Categorization),
            )
        })
    }

    /// Effective status of a section, stage gate and overlay applied.
    pub fn section_status(&self, section: SectionId) -> AnalysisStatus {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return AnalysisStatus::Unstarted;
        };
        if !section.is_known() || !self.section_work_visible() {
            return AnalysisStatus::Unstarted;
        }
        self.overlay
            .status_for(section, self.generation)
            .unwrap_or_else(|| snapshot.section_status(section))
    }

    pub fn section_access(&self, section: SectionId) -> SectionAccess {
        can_enter(section, self.section_status(section))
    }

    /// Every known section Succeeded or Failed.
    pub fn is_fully_terminal(&self) -> bool {
        self.section_work_visible()
            && SectionId::all().all(|section| self.section_status(section).is_terminal())
    }

    /// Whether any stage or section is currently analyzing.
    pub fn is_busy(&self) -> bool {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return false;
        };
        let analyzing = AnalysisStatus::Analyzing;
        snapshot.effective_stage(Stage::Segmentation) == analyzing
            || snapshot.effective_stage(Stage::Categorization) == analyzing
            || SectionId::all().any(|section| self.section_status(section) == analyzing)
            || snapshot.unmodeled.values().any(|status| *status == analyzing)
    }

    pub fn update(&self) -> MonitorUpdate {
        MonitorUpdate {
            tender_id: self.tender_id.clone(),
            generation: self.generation,
            snapshot: self.snapshot.clone(),
            last_error: self.last_error.clone(),
            observed_at: self.observed_at,
        }
    }

    pub fn overview(&self, reanalysis_in_flight: Option<SectionId>) -> PipelineOverview {
        let snapshot = self.snapshot.as_ref();
        PipelineOverview {
            tender_id: self.tender_id.clone(),
            phase: snapshot.map(PipelinePhase::from_snapshot),
            section_work_visible: self.section_work_visible(),
            segmentation: snapshot
                .map(|s| s.effective_stage(Stage::Segmentation))
                .unwrap_or_default(),
            categorization: snapshot
                .map(|s| s.effective_stage(Stage::Categorization))
                .unwrap_or_default(),
            sections: SectionId::all()
                .map(|section| self.section_access(section))
                .collect(),
            progress: snapshot.map(|s| s.progress.clone()),
            settled: snapshot.is_some_and(Snapshot::is_settled),
            fully_terminal: self.is_fully_terminal(),
            reanalysis_in_flight,
            last_error: self.last_error.clone(),
        }
    }
}

fn reported_status(snapshot: Option<&Snapshot>, section: SectionId) -> AnalysisStatus {
    match snapshot {
        Some(snapshot)
            if section_work_visible(
                snapshot.effective_stage(Stage::Segmentation),
                snapshot.effective_stage(Stage::Categorization),
            ) =>
        {
            snapshot.section_status(section)
        }
        _ => AnalysisStatus::Unstarted,
    }
}
