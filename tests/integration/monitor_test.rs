//! Tender Monitor Integration Tests
//!
//! End-to-end behavior of tender views driven through the command layer
//! against an in-memory analysis service, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use tender_monitor_core::{AccessBadge, AnalysisStatus, PipelinePhase, SectionId, TenderId};
use tender_monitor_desktop::commands::monitor::{
    close_tender_view, fetch_section_detail, get_pipeline_overview, get_section_access,
    open_tender_view, request_section_reanalysis, select_section_tab, trigger_full_analysis,
    MonitorState,
};

use crate::support::{coordinator_settings, session_settings, status_body, FakeAnalysisService};

const TENDER: &str = "T-100";

// ============================================================================
// Helper Functions
// ============================================================================

async fn monitor_with(service: &Arc<FakeAnalysisService>) -> MonitorState {
    let state = MonitorState::new();
    state
        .configure(service.clone(), coordinator_settings(), session_settings())
        .await;
    state
}

/// Let spawned tasks run without advancing to the next poll.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn badge(state: &MonitorState, key: &str) -> AccessBadge {
    get_section_access(state, TENDER.to_string(), key.to_string())
        .await
        .data
        .unwrap()
        .badge
}

// ============================================================================
// Stage progression
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stage_progression_unlocks_section_tabs() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "processing",
        "pending",
        &[],
    )));
    let state = monitor_with(&service).await;

    let response = open_tender_view(&state, TENDER.to_string()).await;
    assert!(response.success);
    settle().await;

    let overview = get_pipeline_overview(&state, TENDER.to_string()).await.data.unwrap();
    assert_eq!(overview.phase, Some(PipelinePhase::Segmentation));
    assert!(!overview.section_work_visible);
    assert!(overview.sections.iter().all(|s| s.badge == AccessBadge::Locked));

    service.set_status(status_body(TENDER, "completed", "processing", &[]));
    tokio::time::sleep(Duration::from_secs(7)).await;
    let overview = get_pipeline_overview(&state, TENDER.to_string()).await.data.unwrap();
    assert_eq!(overview.phase, Some(PipelinePhase::Categorization));
    assert_eq!(overview.categorization, AnalysisStatus::Analyzing);

    service.set_status(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "processing")],
    ));
    tokio::time::sleep(Duration::from_secs(7)).await;
    let overview = get_pipeline_overview(&state, TENDER.to_string()).await.data.unwrap();
    assert_eq!(overview.phase, Some(PipelinePhase::SectionAnalysis));
    assert!(overview.section_work_visible);
    let progress = overview.progress.unwrap();
    assert_eq!(progress.total, 2);
    assert_eq!(progress.completion_percent, 50.0);

    assert_eq!(badge(&state, "eligibility").await, AccessBadge::Checkmark);
    assert_eq!(badge(&state, "scope").await, AccessBadge::Spinner);
    assert_eq!(badge(&state, "timeline").await, AccessBadge::Locked);

    close_tender_view(&state, TENDER.to_string()).await;
}

#[tokio::test(start_paused = true)]
async fn test_sections_ignored_until_categorization_succeeds() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "completed",
        "processing",
        &[("eligibility_criteria", "completed")],
    )));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;

    assert_eq!(badge(&state, "eligibility").await, AccessBadge::Locked);
    let response = fetch_section_detail(&state, TENDER.to_string(), "eligibility".to_string()).await;
    assert!(!response.success);
    assert!(service.detail_calls().is_empty());

    close_tender_view(&state, TENDER.to_string()).await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_stage_halts_and_parks_polling() {
    let service = Arc::new(FakeAnalysisService::new(status_body(TENDER, "failed", "pending", &[])));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;

    let overview = get_pipeline_overview(&state, TENDER.to_string()).await.data.unwrap();
    assert!(matches!(overview.phase, Some(PipelinePhase::Halted(_))));
    assert!(overview.settled);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.status_calls(), 1);

    let response = trigger_full_analysis(&state, TENDER.to_string()).await;
    assert!(response.success);
    assert_eq!(service.full_analysis_calls(), 1);
    settle().await;
    assert_eq!(service.status_calls(), 2);

    close_tender_view(&state, TENDER.to_string()).await;
}

// ============================================================================
// Reanalysis
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reanalysis_of_failed_section_end_to_end() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "failed")],
    )));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;

    assert_eq!(badge(&state, "scope").await, AccessBadge::Warning { retry: true });
    let response = fetch_section_detail(&state, TENDER.to_string(), "scope".to_string()).await;
    assert!(response.error.unwrap().contains("not available yet"));

    service.set_status(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "processing")],
    ));
    let response = request_section_reanalysis(&state, TENDER.to_string(), "scope".to_string()).await;
    assert!(response.success);
    assert_eq!(service.reanalyze_calls(), vec!["scope_of_work"]);

    settle().await;
    assert_eq!(service.status_calls(), 2);
    assert_eq!(badge(&state, "scope").await, AccessBadge::Spinner);

    service.set_status(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "completed")],
    ));
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(badge(&state, "scope").await, AccessBadge::Checkmark);

    let detail = fetch_section_detail(&state, TENDER.to_string(), "scope".to_string())
        .await
        .data
        .unwrap();
    assert_eq!(detail.section, SectionId::ScopeOfWork);

    // settled again: polling stops once the follow-up window is over
    tokio::time::sleep(Duration::from_secs(30)).await;
    let calls = service.status_calls();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.status_calls(), calls);

    close_tender_view(&state, TENDER.to_string()).await;
}

#[tokio::test(start_paused = true)]
async fn test_reanalysis_invalidates_only_that_section() {
    let done = status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "completed")],
    );
    let service = Arc::new(FakeAnalysisService::new(done));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;

    fetch_section_detail(&state, TENDER.to_string(), "eligibility".to_string()).await;
    fetch_section_detail(&state, TENDER.to_string(), "scope".to_string()).await;

    service.queue_status(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "processing")],
    ));
    let response = request_section_reanalysis(&state, TENDER.to_string(), "scope".to_string()).await;
    assert!(response.success);
    settle().await;
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(badge(&state, "scope").await, AccessBadge::Checkmark);

    fetch_section_detail(&state, TENDER.to_string(), "eligibility".to_string()).await;
    let detail = fetch_section_detail(&state, TENDER.to_string(), "scope".to_string())
        .await
        .data
        .unwrap();
    assert_eq!(detail.payload["revision"], 3);
    assert_eq!(
        service.detail_calls(),
        vec!["eligibility_criteria", "scope_of_work", "scope_of_work"]
    );

    close_tender_view(&state, TENDER.to_string()).await;
}

#[tokio::test(start_paused = true)]
async fn test_reanalysis_picked_up_late_is_followed_and_refetched() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "completed")],
    )));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;
    fetch_section_detail(&state, TENDER.to_string(), "scope".to_string()).await;

    // accepted, but the service still reports the previous run
    let response = request_section_reanalysis(&state, TENDER.to_string(), "scope".to_string()).await;
    assert!(response.success);
    settle().await;
    assert_eq!(service.status_calls(), 2);
    assert_eq!(badge(&state, "scope").await, AccessBadge::Checkmark);

    // tab opened before the re-run shows up
    let detail = fetch_section_detail(&state, TENDER.to_string(), "scope".to_string())
        .await
        .data
        .unwrap();
    assert_eq!(detail.payload["revision"], 2);

    service.set_status(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "processing")],
    ));
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(badge(&state, "scope").await, AccessBadge::Spinner);

    service.set_status(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "completed")],
    ));
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(badge(&state, "scope").await, AccessBadge::Checkmark);

    let detail = fetch_section_detail(&state, TENDER.to_string(), "scope".to_string())
        .await
        .data
        .unwrap();
    assert_eq!(detail.payload["revision"], 3);
    assert_eq!(
        service.detail_calls(),
        vec!["scope_of_work", "scope_of_work", "scope_of_work"]
    );

    close_tender_view(&state, TENDER.to_string()).await;
}

#[tokio::test(start_paused = true)]
async fn test_reanalysis_rejections_make_no_request() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "completed",
        "completed",
        &[("tender_summary", "failed"), ("scope_of_work", "failed")],
    )));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;

    assert_eq!(badge(&state, "summary").await, AccessBadge::Warning { retry: false });

    let response = request_section_reanalysis(&state, TENDER.to_string(), "summary".to_string()).await;
    assert!(response.error.unwrap().contains("cannot be reanalyzed"));

    let response = request_section_reanalysis(&state, TENDER.to_string(), "warranty".to_string()).await;
    assert!(response.error.unwrap().contains("warranty"));

    let response = request_section_reanalysis(&state, "T-404".to_string(), "scope".to_string()).await;
    assert!(response.error.unwrap().contains("No open view"));

    assert!(service.reanalyze_calls().is_empty());
    close_tender_view(&state, TENDER.to_string()).await;
}

#[tokio::test(start_paused = true)]
async fn test_full_analysis_refused_while_running() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "completed",
        "completed",
        &[("scope_of_work", "processing")],
    )));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;

    let response = trigger_full_analysis(&state, TENDER.to_string()).await;
    assert!(response.error.unwrap().contains("still running"));
    assert_eq!(service.full_analysis_calls(), 0);

    close_tender_view(&state, TENDER.to_string()).await;
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_teardown_mid_poll_discards_late_result() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "processing",
        "pending",
        &[],
    )));
    service.set_status_delay(Duration::from_secs(5));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    let monitor = state.get(&TenderId::new(TENDER)).await.unwrap();
    let updates = monitor.subscribe();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(service.status_calls(), 1);
    let response = close_tender_view(&state, TENDER.to_string()).await;
    assert_eq!(response.data, Some(true));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.status_calls(), 1);
    assert_eq!(updates.borrow().generation, 0);
    assert!(monitor.is_closed());
    assert!(!get_pipeline_overview(&state, TENDER.to_string()).await.success);
}

#[tokio::test(start_paused = true)]
async fn test_reopening_replaces_previous_view() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "processing",
        "pending",
        &[],
    )));
    let state = monitor_with(&service).await;

    open_tender_view(&state, TENDER.to_string()).await;
    let first = state.get(&TenderId::new(TENDER)).await.unwrap();
    open_tender_view(&state, TENDER.to_string()).await;
    let second = state.get(&TenderId::new(TENDER)).await.unwrap();

    assert!(first.is_closed());
    assert!(!second.is_closed());
    assert_ne!(first.session_id(), second.session_id());
    assert_eq!(state.open_count().await, 1);

    state.close_all().await;
    assert!(second.is_closed());
    assert_eq!(state.open_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_snapshot_falls_back_to_no_data() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("scope_of_work", "processing")],
    )));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;
    assert_eq!(badge(&state, "eligibility").await, AccessBadge::Checkmark);

    service.queue_status(r#"{"tender_id": "T-100", "stages": {}}"#.to_string());
    tokio::time::sleep(Duration::from_secs(7)).await;
    let overview = get_pipeline_overview(&state, TENDER.to_string()).await.data.unwrap();
    assert!(overview.phase.is_none());
    assert!(overview.last_error.unwrap().contains("Malformed snapshot"));
    assert_eq!(badge(&state, "eligibility").await, AccessBadge::Locked);

    // the next valid snapshot restores the view
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(badge(&state, "eligibility").await, AccessBadge::Checkmark);

    close_tender_view(&state, TENDER.to_string()).await;
}

#[tokio::test(start_paused = true)]
async fn test_select_tab_through_commands() {
    let service = Arc::new(FakeAnalysisService::new(status_body(
        TENDER,
        "completed",
        "completed",
        &[("eligibility_criteria", "completed"), ("key_dates", "processing")],
    )));
    let state = monitor_with(&service).await;
    open_tender_view(&state, TENDER.to_string()).await;
    settle().await;

    let response = select_section_tab(&state, TENDER.to_string(), "timeline".to_string()).await;
    assert_eq!(response.data, Some(None));
    let response = select_section_tab(&state, TENDER.to_string(), "eligibility".to_string()).await;
    assert_eq!(response.data, Some(Some(SectionId::Eligibility)));
    let response = select_section_tab(&state, TENDER.to_string(), "timeline".to_string()).await;
    assert_eq!(response.data, Some(Some(SectionId::Eligibility)));

    close_tender_view(&state, TENDER.to_string()).await;
}
