//! Initialization Commands
//!
//! Commands for application initialization and setup.

use crate::commands::monitor::MonitorState;
use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Initialize the application on startup: load settings and build the
/// analysis service client.
pub async fn init_app(state: &AppState, monitor: &MonitorState) -> CommandResponse<String> {
    if let Err(e) = state.initialize().await {
        return CommandResponse::err(e.to_string());
    }
    match monitor.initialize(state).await {
        Ok(()) => CommandResponse::ok("Application initialized successfully".to_string()),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

/// Get the application version
pub fn get_version() -> CommandResponse<String> {
    CommandResponse::ok(env!("CARGO_PKG_VERSION").to_string())
}
