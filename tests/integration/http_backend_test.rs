//! HTTP Backend Integration Tests
//!
//! Drives a tender view against a mock analysis service over real HTTP.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tender_monitor_core::{AccessBadge, PipelinePhase};
use tender_monitor_desktop::commands::monitor::{
    close_tender_view, fetch_section_detail, get_pipeline_overview, get_section_access,
    open_tender_view, request_section_reanalysis, MonitorState,
};
use tender_monitor_desktop::models::monitor::PipelineOverview;
use tender_monitor_desktop::models::settings::{PollSettings, SessionSettings};
use tender_monitor_desktop::services::pipeline::HttpAnalysisBackend;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{coordinator_settings, session_settings, status_body};

const TENDER: &str = "T-200";
const BASE: &str = "/api/tenders/T-200/analysis";

fn fast_settings() -> SessionSettings {
    SessionSettings {
        poll: PollSettings {
            interval: Duration::from_millis(50),
            request_timeout: Duration::from_secs(5),
        },
        ..session_settings()
    }
}

async fn monitor_for(server: &MockServer) -> MonitorState {
    let backend =
        HttpAnalysisBackend::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
    let state = MonitorState::new();
    state
        .configure(Arc::new(backend), coordinator_settings(), fast_settings())
        .await;
    state
}

/// Poll the overview until `check` holds or two seconds pass.
async fn wait_until<F>(state: &MonitorState, check: F) -> PipelineOverview
where
    F: Fn(&PipelineOverview) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let overview = get_pipeline_overview(state, TENDER.to_string())
            .await
            .data
            .unwrap();
        if check(&overview) || tokio::time::Instant::now() >= deadline {
            return overview;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_view_over_http_reaches_section_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/status", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_string(status_body(
            TENDER,
            "completed",
            "completed",
            &[("eligibility_criteria", "completed"), ("scope_of_work", "failed")],
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/sections/eligibility_criteria", BASE)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"criteria": ["ISO 9001"]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/sections/scope_of_work/reanalyze", BASE)))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"accepted": true})))
        .expect(1)
        .mount(&server)
        .await;

    let state = monitor_for(&server).await;
    open_tender_view(&state, TENDER.to_string()).await;

    let overview = wait_until(&state, |o| o.phase.is_some()).await;
    assert_eq!(overview.phase, Some(PipelinePhase::SectionAnalysis));
    assert!(overview.settled);

    let access = get_section_access(&state, TENDER.to_string(), "scope".to_string())
        .await
        .data
        .unwrap();
    assert_eq!(access.badge, AccessBadge::Warning { retry: true });

    for _ in 0..2 {
        let detail = fetch_section_detail(&state, TENDER.to_string(), "eligibility".to_string())
            .await
            .data
            .unwrap();
        assert_eq!(detail.payload["criteria"][0], "ISO 9001");
    }

    let response = request_section_reanalysis(&state, TENDER.to_string(), "scope".to_string()).await;
    assert!(response.success);
    assert!(response.data.unwrap().accepted);

    close_tender_view(&state, TENDER.to_string()).await;
    server.verify().await;
}

#[tokio::test]
async fn test_server_errors_are_reported_and_polling_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/status", BASE)))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/status", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_string(status_body(
            TENDER,
            "processing",
            "pending",
            &[],
        )))
        .mount(&server)
        .await;

    let state = monitor_for(&server).await;
    open_tender_view(&state, TENDER.to_string()).await;

    let overview = wait_until(&state, |o| o.phase.is_some()).await;
    assert_eq!(overview.phase, Some(PipelinePhase::Segmentation));
    assert!(overview.last_error.is_none());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 2);

    close_tender_view(&state, TENDER.to_string()).await;
}
