//! Monitor Models
//!
//! Data handed to the dashboard by the pipeline monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tender_monitor_core::{
    AnalysisStatus, PipelinePhase, Progress, SectionAccess, SectionId, Snapshot, TenderId,
};

/// Published on every change of a tender view's pipeline state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorUpdate {
    pub tender_id: TenderId,
    /// Incremented on every applied snapshot or reset
    pub generation: u64,
    /// Latest authoritative snapshot; `None` means "no data yet"
    pub snapshot: Option<Snapshot>,
    /// Most recent poll failure, cleared by the next good snapshot
    pub last_error: Option<String>,
    /// When the snapshot was received
    pub observed_at: Option<DateTime<Utc>>,
}

impl MonitorUpdate {
    /// Initial update before anything was fetched.
    pub fn pending(tender_id: TenderId) -> Self {
        Self {
            tender_id,
            generation: 0,
            snapshot: None,
            last_error: None,
            observed_at: None,
        }
    }
}

/// Render model for a tender view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOverview {
    pub tender_id: TenderId,
    /// `None` until the first valid snapshot arrives
    pub phase: Option<PipelinePhase>,
    /// Whether section tabs are shown instead of the progress view
    pub section_work_visible: bool,
    /// Stage 1 status
    pub segmentation: AnalysisStatus,
    /// Stage 2 status after stage ordering
    pub categorization: AnalysisStatus,
    /// One entry per modeled section, in tab order
    pub sections: Vec<SectionAccess>,
    /// Backend-reported counters, verbatim
    pub progress: Option<Progress>,
    pub settled: bool,
    pub fully_terminal: bool,
    /// Section with a reanalysis request currently being submitted
    pub reanalysis_in_flight: Option<SectionId>,
    pub last_error: Option<String>,
}

/// Detail payload of one analyzed section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDetail {
    pub section: SectionId,
    /// Opaque content rendered by the dashboard
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

/// Static description of a section tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub section: SectionId,
    pub tab_key: String,
    pub title: String,
    pub reanalyzable: bool,
}

impl SectionDescriptor {
    /// Descriptors for every modeled section, in tab order.
    pub fn all() -> Vec<Self> {
        SectionId::all()
            .map(|section| Self {
                section,
                tab_key: section.tab_key().to_string(),
                title: section.title().to_string(),
                reanalyzable: section.is_reanalyzable(),
            })
            .collect()
    }
}
