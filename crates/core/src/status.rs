//! Analysis Status
//!
//! The four-state status shared by the two prerequisite stages and every
//! section, plus the remote spellings it is decoded from.

use serde::{Deserialize, Serialize};

/// Status of a stage or section as reported by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Work has not started yet
    #[default]
    Unstarted,
    /// Work is running on the service
    Analyzing,
    /// Work finished and results are available
    Succeeded,
    /// Work finished with a reported failure
    Failed,
}

impl AnalysisStatus {
    /// Parse a status string as the remote service spells it.
    ///
    /// Returns `None` for anything unrecognised so the caller can fail closed.
    pub fn from_remote(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unstarted" | "not_started" | "pending" | "queued" | "idle" => {
                Some(AnalysisStatus::Unstarted)
            }
            "analyzing" | "processing" | "in_progress" | "running" => {
                Some(AnalysisStatus::Analyzing)
            }
            "succeeded" | "success" | "completed" | "done" => Some(AnalysisStatus::Succeeded),
            "failed" | "error" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further transition is expected without user action.
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Succeeded | AnalysisStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Unstarted => "unstarted",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Succeeded => "succeeded",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two ordered prerequisite stages that precede section work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Stage 1: splitting the tender document into segments
    Segmentation,
    /// Stage 2: assigning segments to content categories
    Categorization,
}

impl Stage {
    /// Key used for this stage in the remote `stages` object.
    pub fn remote_name(self) -> &'static str {
        match self {
            Stage::Segmentation => "segmentation",
            Stage::Categorization => "categorization",
        }
    }
}
