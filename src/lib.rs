//! Tender Monitor Desktop - Rust Backend Library
//!
//! Backend for the tender analysis dashboard. It follows a tender's remote
//! analysis pipeline and decides what the dashboard may show:
//! - Command handlers the frontend calls
//! - Pipeline monitoring services (poller, state, cache, reanalysis)
//! - Storage layer (JSON config)
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export commonly used items from commands
pub use commands::{
    // Init commands
    init_app, get_version,
    // Health commands
    get_health,
    // Settings commands
    get_settings, update_settings,
    // Monitor commands
    open_tender_view, close_tender_view, get_pipeline_overview, get_section_access,
    select_section_tab, request_section_reanalysis, fetch_section_detail,
    trigger_full_analysis, refresh_pipeline, list_sections, MonitorState,
};
// Re-export models (avoiding settings module conflict)
pub use models::monitor::*;
pub use models::response::*;
pub use models::settings::{MonitorConfig, MonitorSettingsUpdate};
pub use services::pipeline::TenderMonitor;
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
