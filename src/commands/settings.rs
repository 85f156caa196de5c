//! Settings Commands
//!
//! Commands for reading and updating monitor settings.

use crate::commands::monitor::MonitorState;
use crate::models::response::CommandResponse;
use crate::models::settings::{MonitorConfig, MonitorSettingsUpdate};
use crate::state::AppState;

/// Get current monitor settings
pub async fn get_settings(state: &AppState) -> CommandResponse<MonitorConfig> {
    match state.get_config().await {
        Ok(config) => CommandResponse::ok(config),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

/// Update monitor settings with a partial update.
///
/// Tender views opened afterwards use the new settings.
pub async fn update_settings(
    state: &AppState,
    monitor: &MonitorState,
    update: MonitorSettingsUpdate,
) -> CommandResponse<MonitorConfig> {
    let config = match state.update_config(update).await {
        Ok(config) => config,
        Err(e) => return CommandResponse::err(e.to_string()),
    };
    match monitor.apply_config(&config).await {
        Ok(()) => CommandResponse::ok(config),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}
