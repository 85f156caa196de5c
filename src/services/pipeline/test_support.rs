//! Scripted backend and observer shared by the pipeline unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tender_monitor_core::{
    Acknowledgement, AnalysisBackend, AnalysisStatus, MonitorError, MonitorResult, Progress,
    SectionId, Snapshot, TenderId,
};
use tokio::sync::Semaphore;

use super::poller::SnapshotObserver;

/// Snapshot for tender `T-1` with progress counters derived from `sections`.
pub fn snapshot(
    segmentation: AnalysisStatus,
    categorization: AnalysisStatus,
    sections: &[(SectionId, AnalysisStatus)],
) -> Snapshot {
    let sections: BTreeMap<_, _> = sections.iter().copied().collect();
    let count = |status: AnalysisStatus| sections.values().filter(|s| **s == status).count() as u32;
    let mut progress = Progress {
        total: sections.len() as u32,
        succeeded: count(AnalysisStatus::Succeeded),
        failed: count(AnalysisStatus::Failed),
        analyzing: count(AnalysisStatus::Analyzing),
        not_started: count(AnalysisStatus::Unstarted),
        completion_percent: 0.0,
    };
    progress.completion_percent = progress.implied_percent();

    Snapshot {
        tender_id: TenderId::new("T-1"),
        segmentation,
        categorization,
        sections,
        unmodeled: BTreeMap::new(),
        progress,
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory `AnalysisBackend` driven by a script.
///
/// Snapshot results are served in push order; the last one repeats.
pub struct ScriptedBackend {
    snapshots: Mutex<VecDeque<MonitorResult<Snapshot>>>,
    last_snapshot: Mutex<Option<MonitorResult<Snapshot>>>,
    snapshot_delay: Mutex<Duration>,
    snapshot_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    details: Mutex<HashMap<String, Value>>,
    detail_calls: Mutex<Vec<String>>,
    reanalyze_calls: Mutex<Vec<String>>,
    full_analysis_calls: AtomicUsize,
    trigger_result: Mutex<MonitorResult<Acknowledgement>>,
    trigger_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::new()),
            last_snapshot: Mutex::new(None),
            snapshot_delay: Mutex::new(Duration::ZERO),
            snapshot_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            details: Mutex::new(HashMap::new()),
            detail_calls: Mutex::new(Vec::new()),
            reanalyze_calls: Mutex::new(Vec::new()),
            full_analysis_calls: AtomicUsize::new(0),
            trigger_result: Mutex::new(Ok(Acknowledgement::accepted())),
            trigger_gate: Mutex::new(None),
        }
    }

    pub fn push_snapshot(&self, snapshot: Snapshot) {
        self.snapshots.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn push_error(&self, error: MonitorError) {
        self.snapshots.lock().unwrap().push_back(Err(error));
    }

    pub fn set_snapshot_delay(&self, delay: Duration) {
        *self.snapshot_delay.lock().unwrap() = delay;
    }

    pub fn set_detail(&self, remote_section: &str, payload: Value) {
        self.details
            .lock()
            .unwrap()
            .insert(remote_section.to_string(), payload);
    }

    pub fn set_trigger_result(&self, result: MonitorResult<Acknowledgement>) {
        *self.trigger_result.lock().unwrap() = result;
    }

    /// Block reanalysis and full-analysis calls until `release_triggers`.
    pub fn hold_triggers(&self) {
        *self.trigger_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_triggers(&self) {
        if let Some(gate) = self.trigger_gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn reanalyze_calls(&self) -> Vec<String> {
        self.reanalyze_calls.lock().unwrap().clone()
    }

    pub fn full_analysis_calls(&self) -> usize {
        self.full_analysis_calls.load(Ordering::SeqCst)
    }

    async fn wait_for_gate(&self) {
        let gate = self.trigger_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn snapshot(&self, _tender: &TenderId) -> MonitorResult<Snapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let delay = *self.snapshot_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let next = self.snapshots.lock().unwrap().pop_front();
        let mut last = self.last_snapshot.lock().unwrap();
        if let Some(next) = next {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Err(MonitorError::network("no snapshot scripted")))
    }

    async fn section_detail(&self, _tender: &TenderId, remote_section: &str) -> MonitorResult<Value> {
        self.detail_calls
            .lock()
            .unwrap()
            .push(remote_section.to_string());
        let payload = self.details.lock().unwrap().get(remote_section).cloned();
        Ok(payload.unwrap_or_else(|| json!({ "section": remote_section })))
    }

    async fn reanalyze_section(
        &self,
        _tender: &TenderId,
        remote_section: &str,
    ) -> MonitorResult<Acknowledgement> {
        self.reanalyze_calls
            .lock()
            .unwrap()
            .push(remote_section.to_string());
        self.wait_for_gate().await;
        self.trigger_result.lock().unwrap().clone()
    }

    async fn trigger_full_analysis(&self, _tender: &TenderId) -> MonitorResult<Acknowledgement> {
        self.full_analysis_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.trigger_result.lock().unwrap().clone()
    }
}

/// Observer that records everything it is told.
#[derive(Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<Snapshot>>,
    errors: Mutex<Vec<MonitorError>>,
}

impl RecordingObserver {
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<MonitorError> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotObserver for RecordingObserver {
    async fn on_snapshot(&self, snapshot: Snapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }

    async fn on_poll_error(&self, error: MonitorError) {
        self.errors.lock().unwrap().push(error);
    }
}
