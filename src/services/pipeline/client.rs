//! Analysis Service HTTP Client
//!
//! `AnalysisBackend` implementation over the analysis service's REST API:
//!
//! - `GET  {base}/tenders/{id}/analysis/status` - pipeline snapshot
//! - `GET  {base}/tenders/{id}/analysis/sections/{name}` - section detail
//! - `POST {base}/tenders/{id}/analysis/sections/{name}/reanalyze` - re-run one section
//! - `POST {base}/tenders/{id}/analysis` - start the whole pipeline
//!
//! Path segments are percent-encoded. Responses are decoded here and handed
//! upward already validated.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tender_monitor_core::{Acknowledgement, AnalysisBackend, MonitorError, MonitorResult, Snapshot, TenderId};

use crate::models::settings::MonitorConfig;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the remote analysis service.
pub struct HttpAnalysisBackend {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpAnalysisBackend {
    /// Create a client for the given API base URL.
    pub fn new(base_url: &str, timeout: Duration) -> MonitorResult<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| MonitorError::validation(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(MonitorError::validation(format!(
                "API base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("TenderMonitor/1.0 (Desktop)")
            .build()
            .map_err(|e| MonitorError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs().max(1),
        })
    }

    /// Create a client from the monitor configuration.
    pub fn from_config(config: &MonitorConfig) -> MonitorResult<Self> {
        let timeout = if config.request_timeout_secs == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(config.request_timeout_secs)
        };
        Self::new(&config.api_base_url, timeout)
    }

    /// Build `{base}/tenders/{id}/analysis[/extra...]` with encoded segments.
    fn endpoint(&self, tender: &TenderId, extra: &[&str]) -> String {
        let mut url = format!(
            "{}/tenders/{}/analysis",
            self.base_url,
            urlencoding::encode(tender.as_str())
        );
        for segment in extra {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn read_success_body(&self, response: reqwest::Response) -> MonitorResult<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        response
            .text()
            .await
            .map_err(|e| self.map_request_error(e))
    }

    async fn post_trigger(&self, url: String) -> MonitorResult<Acknowledgement> {
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        let body = self.read_success_body(response).await?;
        parse_acknowledgement(&body).into_result()
    }

    fn map_request_error(&self, err: reqwest::Error) -> MonitorError {
        if err.is_timeout() {
            MonitorError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            MonitorError::network(format!("Connection failed: {}", err))
        } else {
            MonitorError::network(err.to_string())
        }
    }
}

/// An empty or non-JSON 2xx body still counts as an acknowledgement.
fn parse_acknowledgement(body: &str) -> Acknowledgement {
    if body.trim().is_empty() {
        return Acknowledgement::accepted();
    }
    match serde_json::from_str::<Acknowledgement>(body) {
        Ok(ack) => ack,
        Err(e) => {
            tracing::debug!(error = %e, "acknowledgement body is not JSON, treating as accepted");
            Acknowledgement::accepted()
        }
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn snapshot(&self, tender: &TenderId) -> MonitorResult<Snapshot> {
        let url = self.endpoint(tender, &["status"]);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        let body = self.read_success_body(response).await?;
        Snapshot::from_json(tender, &body)
    }

    async fn section_detail(&self, tender: &TenderId, remote_section: &str) -> MonitorResult<Value> {
        let url = self.endpoint(tender, &["sections", remote_section]);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        let body = self.read_success_body(response).await?;
        serde_json::from_str(&body).map_err(|e| {
            MonitorError::InvalidResponse(format!(
                "section '{}' detail is not valid JSON: {}",
                remote_section, e
            ))
        })
    }

    async fn reanalyze_section(
        &self,
        tender: &TenderId,
        remote_section: &str,
    ) -> MonitorResult<Acknowledgement> {
        let url = self.endpoint(tender, &["sections", remote_section, "reanalyze"]);
        self.post_trigger(url).await
    }

    async fn trigger_full_analysis(&self, tender: &TenderId) -> MonitorResult<Acknowledgement> {
        let url = self.endpoint(tender, &[]);
        self.post_trigger(url).await
    }
}
