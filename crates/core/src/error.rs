//! Core Error Types
//!
//! Error taxonomy for the analysis-pipeline monitor. These types are
//! dependency-free (only thiserror + serde_json) so the core crate stays
//! lightweight; the application crate wraps them in its own `AppError`.
//!
//! A section or stage that the backend reports as `Failed` is NOT an error
//! value here. It is a first-class status rendered with a retry affordance.

use thiserror::Error;

use crate::section::SectionId;
use crate::status::AnalysisStatus;

/// Why a reanalysis (or full pipeline trigger) was refused before any
/// network call was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// Another request is already outstanding for the same tender.
    InFlight {
        /// Section of the outstanding request, `None` for a full-pipeline run.
        section: Option<SectionId>,
    },
    /// The remote pipeline cannot re-run this section on its own.
    ExcludedSection(SectionId),
    /// The section has no remote counterpart.
    UnknownSection(String),
    /// A stage or section is still analyzing, so a full run is refused.
    PipelineBusy,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictReason::InFlight { section: Some(section) } => write!(
                f,
                "a reanalysis of '{}' is already in progress for this tender",
                section.title()
            ),
            ConflictReason::InFlight { section: None } => {
                write!(f, "a full analysis run is already being submitted for this tender")
            }
            ConflictReason::ExcludedSection(section) => write!(
                f,
                "'{}' cannot be reanalyzed independently",
                section.title()
            ),
            ConflictReason::UnknownSection(key) => {
                write!(f, "section '{}' is not known to the analysis service", key)
            }
            ConflictReason::PipelineBusy => {
                write!(f, "the analysis pipeline is still running")
            }
        }
    }
}

/// Error type for the analysis-pipeline monitor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// The request did not complete (connection, DNS, body read).
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the defensive timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The service answered with a non-success status code.
    #[error("HTTP error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// A non-snapshot response body could not be parsed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The snapshot was missing fields or internally inconsistent.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// A reanalysis request was rejected locally.
    #[error("Reanalysis rejected: {0}")]
    ReanalysisConflict(ConflictReason),

    /// Section detail was requested for a section that may not be entered.
    #[error("Section '{section}' is not available yet (status: {status})")]
    SectionLocked {
        section: SectionId,
        status: AnalysisStatus,
    },

    /// The service acknowledged the request but refused it.
    #[error("Request rejected by analysis service: {0}")]
    Rejected(String),

    /// The monitoring session has been closed.
    #[error("Monitoring session closed")]
    SessionClosed,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for monitor errors
pub type MonitorResult<T> = Result<T, MonitorError>;

impl MonitorError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a malformed snapshot error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedSnapshot(msg.into())
    }

    /// Create a reanalysis conflict
    pub fn conflict(reason: ConflictReason) -> Self {
        Self::ReanalysisConflict(reason)
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this failure is expected to clear up on its own.
    ///
    /// The poller treats every error as retryable; this flag only decides
    /// how loudly the UI reports it.
    pub fn is_transient(&self) -> bool {
        match self {
            MonitorError::Network(_) | MonitorError::Timeout(_) => true,
            MonitorError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::MalformedSnapshot(format!("JSON parse error: {}", err))
    }
}

/// Convert MonitorError to a string
impl From<MonitorError> for String {
    fn from(err: MonitorError) -> String {
        err.to_string()
    }
}
