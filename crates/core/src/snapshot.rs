//! Pipeline Snapshot
//!
//! The authoritative state of one tender's analysis pipeline at a point in
//! time. Snapshots are decoded leniently from the wire (`RawSnapshot`) and
//! then validated strictly: anything missing or inconsistent is rejected as a
//! whole, never partially trusted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};
use crate::section::{SectionId, TenderId};
use crate::status::{AnalysisStatus, Stage};

/// Largest accepted gap between the reported and the implied completion
/// percentage. A service that rounds to whole percents reports 1 of 3
/// sections as 33 or 34, never exactly 33.33.
const PERCENT_TOLERANCE: f64 = 1.0;

// ============================================================================
// Progress
// ============================================================================

/// Aggregate section counters exactly as reported by the service.
///
/// The counters may include sections the dashboard does not model, so they
/// are never recomputed from the section map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub analyzing: u32,
    pub not_started: u32,
    pub completion_percent: f64,
}

impl Progress {
    /// Progress block for a pipeline with no sections yet.
    pub fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            analyzing: 0,
            not_started: 0,
            completion_percent: 0.0,
        }
    }

    /// `100 * succeeded / total`, 0 when there are no sections.
    pub fn implied_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * f64::from(self.succeeded) / f64::from(self.total)
        }
    }

    /// Check the counter and percentage invariants.
    pub fn validate(&self) -> MonitorResult<()> {
        let sum = u64::from(self.succeeded)
            + u64::from(self.failed)
            + u64::from(self.analyzing)
            + u64::from(self.not_started);
        if sum != u64::from(self.total) {
            return Err(MonitorError::malformed(format!(
                "progress counters sum to {} but total is {}",
                sum, self.total
            )));
        }

        if !self.completion_percent.is_finite()
            || !(0.0..=100.0).contains(&self.completion_percent)
        {
            return Err(MonitorError::malformed(format!(
                "completion percent {} is out of range",
                self.completion_percent
            )));
        }

        // Whole-percent rounding on the service side must still pass.
        let implied = self.implied_percent();
        if (self.completion_percent - implied).abs() > PERCENT_TOLERANCE {
            return Err(MonitorError::malformed(format!(
                "completion percent {} does not match {} of {} sections succeeded",
                self.completion_percent, self.succeeded, self.total
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Validated pipeline state for one tender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tender_id: TenderId,
    /// Stage 1 as reported
    pub segmentation: AnalysisStatus,
    /// Stage 2 as reported; see [`Snapshot::effective_stage`]
    pub categorization: AnalysisStatus,
    /// Statuses of modeled sections
    pub sections: BTreeMap<SectionId, AnalysisStatus>,
    /// Statuses of sections the dashboard does not model, by remote name
    #[serde(default)]
    pub unmodeled: BTreeMap<String, AnalysisStatus>,
    pub progress: Progress,
}

impl Snapshot {
    /// Status of a stage after applying stage ordering.
    ///
    /// Stage 2 is only meaningful once stage 1 succeeded. Any other report
    /// for it is treated as `Unstarted`.
    pub fn effective_stage(&self, stage: Stage) -> AnalysisStatus {
        match stage {
            Stage::Segmentation => self.segmentation,
            Stage::Categorization => {
                if self.segmentation == AnalysisStatus::Succeeded {
                    self.categorization
                } else {
                    AnalysisStatus::Unstarted
                }
            }
        }
    }

    /// Whether the reported stage 2 status was overridden by stage ordering.
    pub fn has_stage_inconsistency(&self) -> bool {
        self.effective_stage(Stage::Categorization) != self.categorization
    }

    /// Reported status of a modeled section; absent sections have not started.
    pub fn section_status(&self, section: SectionId) -> AnalysisStatus {
        self.sections.get(&section).copied().unwrap_or_default()
    }

    /// Whether nothing in this snapshot is expected to change on its own.
    ///
    /// Stages must both be terminal and every reported section terminal. A
    /// failed stage halts the pipeline, so it settles without section work.
    /// Both stages succeeded with no sections reported means section work
    /// has not been scheduled yet.
    pub fn is_settled(&self) -> bool {
        let stage1 = self.effective_stage(Stage::Segmentation);
        let stage2 = self.effective_stage(Stage::Categorization);

        if stage1 == AnalysisStatus::Failed || stage2 == AnalysisStatus::Failed {
            return true;
        }
        if !(stage1.is_terminal() && stage2.is_terminal()) {
            return false;
        }
        if self.sections.is_empty() && self.unmodeled.is_empty() {
            return false;
        }

        self.sections.values().all(|s| s.is_terminal())
            && self.unmodeled.values().all(|s| s.is_terminal())
    }

    /// Whether every modeled section reached Succeeded or Failed.
    pub fn is_fully_terminal(&self) -> bool {
        SectionId::all().all(|section| self.section_status(section).is_terminal())
    }

    /// Decode and validate a snapshot from a JSON response body.
    pub fn from_json(expected: &TenderId, body: &str) -> MonitorResult<Self> {
        let raw: RawSnapshot = serde_json::from_str(body)?;
        raw.validate(expected)
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// Stage block as sent by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStages {
    #[serde(default)]
    pub segmentation: Option<String>,
    #[serde(default)]
    pub categorization: Option<String>,
}

/// Snapshot as sent by the service, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub tender_id: Option<String>,
    #[serde(default)]
    pub stages: Option<RawStages>,
    #[serde(default)]
    pub sections: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub progress: Option<Progress>,
}

impl RawSnapshot {
    /// Turn the wire shape into a [`Snapshot`] or reject it entirely.
    pub fn validate(self, expected: &TenderId) -> MonitorResult<Snapshot> {
        let tender_id = self
            .tender_id
            .ok_or_else(|| MonitorError::malformed("missing tender_id"))?;
        if tender_id != expected.as_str() {
            return Err(MonitorError::malformed(format!(
                "snapshot is for tender '{}' but '{}' was requested",
                tender_id, expected
            )));
        }

        let stages = self
            .stages
            .ok_or_else(|| MonitorError::malformed("missing stages"))?;
        let segmentation = parse_stage(Stage::Segmentation, stages.segmentation.as_deref())?;
        let categorization = parse_stage(Stage::Categorization, stages.categorization.as_deref())?;

        let mut sections = BTreeMap::new();
        let mut unmodeled = BTreeMap::new();
        for (name, value) in self.sections.unwrap_or_default() {
            let status = AnalysisStatus::from_remote(&value).ok_or_else(|| {
                MonitorError::malformed(format!("section '{}' has unknown status '{}'", name, value))
            })?;
            match SectionId::from_remote_name(&name) {
                SectionId::Unknown => {
                    unmodeled.insert(name, status);
                }
                section => {
                    sections.insert(section, status);
                }
            }
        }

        let progress = self
            .progress
            .ok_or_else(|| MonitorError::malformed("missing progress"))?;
        progress.validate()?;

        Ok(Snapshot {
            tender_id: expected.clone(),
            segmentation,
            categorization,
            sections,
            unmodeled,
            progress,
        })
    }
}

fn parse_stage(stage: Stage, value: Option<&str>) -> MonitorResult<AnalysisStatus> {
    let value = value.ok_or_else(|| {
        MonitorError::malformed(format!("missing stage '{}'", stage.remote_name()))
    })?;
    AnalysisStatus::from_remote(value).ok_or_else(|| {
        MonitorError::malformed(format!(
            "stage '{}' has unknown status '{}'",
            stage.remote_name(),
            value
        ))
    })
}
