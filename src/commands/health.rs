//! Health Check Commands
//!
//! Commands for checking the health status of backend services.

use serde::{Deserialize, Serialize};

use crate::commands::monitor::MonitorState;
use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub config: bool,
    pub open_views: usize,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "unknown".to_string(),
            service: "tender-monitor-desktop".to_string(),
            config: false,
            open_views: 0,
        }
    }
}

/// Get the health status of the backend
pub async fn get_health(state: &AppState, monitor: &MonitorState) -> CommandResponse<HealthResponse> {
    let mut health = HealthResponse::default();

    health.config = state.is_config_healthy();
    health.open_views = monitor.open_count().await;

    health.status = if health.config {
        "healthy".to_string()
    } else {
        "degraded".to_string()
    };

    CommandResponse::ok(health)
}
