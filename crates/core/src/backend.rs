//! Analysis Backend Contract
//!
//! The remote analysis service is an opaque collaborator. The monitor only
//! depends on this trait, so services can be driven by the HTTP client in
//! production and by scripted doubles in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MonitorError, MonitorResult};
use crate::section::TenderId;
use crate::snapshot::Snapshot;

/// Acknowledgement for a fire-and-forget trigger.
///
/// It never reports completion; completion is only observed through a later
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// `false` when the service refused the request
    #[serde(default = "default_accepted")]
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_accepted() -> bool {
    true
}

impl Acknowledgement {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            message: None,
        }
    }

    /// Turn a refusal into `MonitorError::Rejected`.
    pub fn into_result(self) -> MonitorResult<Self> {
        if self.accepted {
            Ok(self)
        } else {
            Err(MonitorError::Rejected(
                self.message
                    .unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }
}

impl Default for Acknowledgement {
    fn default() -> Self {
        Self::accepted()
    }
}

/// Remote operations the monitor consumes.
///
/// Section arguments are remote category names, already mapped through the
/// section lookup table.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Current pipeline state. Idempotent and side-effect free.
    async fn snapshot(&self, tender: &TenderId) -> MonitorResult<Snapshot>;

    /// Detail payload of one analyzed section.
    async fn section_detail(&self, tender: &TenderId, remote_section: &str) -> MonitorResult<Value>;

    /// Start a new run of one section.
    async fn reanalyze_section(
        &self,
        tender: &TenderId,
        remote_section: &str,
    ) -> MonitorResult<Acknowledgement>;

    /// Start the whole pipeline.
    async fn trigger_full_analysis(&self, tender: &TenderId) -> MonitorResult<Acknowledgement>;
}
