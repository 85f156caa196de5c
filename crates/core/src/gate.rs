//! Stage and Access Gates
//!
//! Pure decisions about what the dashboard may show:
//! - `section_work_visible` - whether section tabs are meaningful at all
//! - `can_enter` - whether a section tab may be opened, and its badge
//! - `PipelinePhase` - which step of the three-phase progress view applies

use serde::{Deserialize, Serialize};

use crate::section::SectionId;
use crate::snapshot::Snapshot;
use crate::status::{AnalysisStatus, Stage};

/// True iff both prerequisite stages succeeded.
///
/// Until then section data in a snapshot is ignored and the dashboard shows
/// the progress view instead of section tabs.
pub fn section_work_visible(stage1: AnalysisStatus, stage2: AnalysisStatus) -> bool {
    stage1 == AnalysisStatus::Succeeded && stage2 == AnalysisStatus::Succeeded
}

/// Display affordance attached to a section tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessBadge {
    /// Not started; tab is locked
    Locked,
    /// Analysis running; progress indicator
    Spinner,
    /// Analysis failed; `retry` tells whether a re-run can be offered
    Warning { retry: bool },
    /// Results available
    Checkmark,
}

/// Access decision for one section tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAccess {
    pub section: SectionId,
    pub status: AnalysisStatus,
    pub enterable: bool,
    pub badge: AccessBadge,
}

/// Map a section's status to its access decision.
///
/// Only `Succeeded` is enterable. Unknown sections are always locked.
pub fn can_enter(section: SectionId, status: AnalysisStatus) -> SectionAccess {
    let status = if section.is_known() {
        status
    } else {
        AnalysisStatus::Unstarted
    };

    let badge = match status {
        AnalysisStatus::Unstarted => AccessBadge::Locked,
        AnalysisStatus::Analyzing => AccessBadge::Spinner,
        AnalysisStatus::Failed => AccessBadge::Warning {
            retry: section.is_reanalyzable(),
        },
        AnalysisStatus::Succeeded => AccessBadge::Checkmark,
    };

    SectionAccess {
        section,
        status,
        enterable: status == AnalysisStatus::Succeeded,
        badge,
    }
}

/// Resolve a tab switch request.
///
/// Returns the requested tab when it may be entered, otherwise the current
/// tab unchanged. Selecting a locked tab is a no-op, never an error.
pub fn select_tab(current: Option<SectionId>, requested: &SectionAccess) -> Option<SectionId> {
    if requested.enterable {
        Some(requested.section)
    } else {
        current
    }
}

/// Step of the progress view shown while section tabs are not yet available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "stage", rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Stage 1 has not finished
    Segmentation,
    /// Stage 1 succeeded, stage 2 has not finished
    Categorization,
    /// Both stages succeeded; section tabs are shown
    SectionAnalysis,
    /// A stage failed; the pipeline will not progress without a retry
    Halted(Stage),
}

impl PipelinePhase {
    /// Derive the phase from a snapshot, applying stage ordering.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let stage1 = snapshot.effective_stage(Stage::Segmentation);
        let stage2 = snapshot.effective_stage(Stage::Categorization);
        match (stage1, stage2) {
            (AnalysisStatus::Failed, _) => PipelinePhase::Halted(Stage::Segmentation),
            (AnalysisStatus::Succeeded, AnalysisStatus::Failed) => {
                PipelinePhase::Halted(Stage::Categorization)
            }
            (AnalysisStatus::Succeeded, AnalysisStatus::Succeeded) => PipelinePhase::SectionAnalysis,
            (AnalysisStatus::Succeeded, _) => PipelinePhase::Categorization,
            _ => PipelinePhase::Segmentation,
        }
    }
}
