//! Tender Monitor Commands
//!
//! Commands the dashboard calls to open tender views, read pipeline state,
//! enter section tabs and submit reanalysis requests. Sections are addressed
//! by their dashboard tab key.

use std::collections::HashMap;
use std::sync::Arc;

use tender_monitor_core::{
    Acknowledgement, AnalysisBackend, ConflictReason, MonitorError, SectionAccess, SectionId,
    TenderId,
};
use tokio::sync::RwLock;

use crate::models::monitor::{PipelineOverview, SectionDescriptor, SectionDetail};
use crate::models::response::CommandResponse;
use crate::models::settings::{CoordinatorSettings, MonitorConfig, SessionSettings};
use crate::services::pipeline::{HttpAnalysisBackend, ReanalysisCoordinator, TenderMonitor};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Backend, coordinator and session settings used for new tender views.
struct MonitorRuntime {
    backend: Arc<dyn AnalysisBackend>,
    coordinator: Arc<ReanalysisCoordinator>,
    session_settings: SessionSettings,
}

/// Registry of open tender views
pub struct MonitorState {
    runtime: Arc<RwLock<Option<MonitorRuntime>>>,
    sessions: Arc<RwLock<HashMap<TenderId, Arc<TenderMonitor>>>>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            runtime: Arc::new(RwLock::new(None)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build the HTTP backend from the app configuration
    pub async fn initialize(&self, app_state: &AppState) -> AppResult<()> {
        let config = app_state.get_config().await?;
        self.apply_config(&config).await
    }

    /// Rebuild the backend for views opened from now on.
    ///
    /// Views that are already open keep the backend they started with.
    pub async fn apply_config(&self, config: &MonitorConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let backend = HttpAnalysisBackend::from_config(config)?;
        self.configure(
            Arc::new(backend),
            config.coordinator_settings(),
            config.session_settings(),
        )
        .await;
        tracing::info!(api_base_url = %config.api_base_url, "analysis backend configured");
        Ok(())
    }

    /// Install an explicit backend.
    ///
    /// Reanalysis requests already in flight keep blocking their tender
    /// across the swap.
    pub async fn configure(
        &self,
        backend: Arc<dyn AnalysisBackend>,
        coordinator_settings: CoordinatorSettings,
        session_settings: SessionSettings,
    ) {
        let mut runtime = self.runtime.write().await;
        let coordinator = match runtime.as_ref() {
            Some(current) => current
                .coordinator
                .rebind(backend.clone(), coordinator_settings),
            None => ReanalysisCoordinator::new(backend.clone(), coordinator_settings),
        };
        *runtime = Some(MonitorRuntime {
            backend,
            coordinator: Arc::new(coordinator),
            session_settings,
        });
    }

    /// Open a view of `tender_id`, replacing one that is already open.
    pub async fn open(&self, tender_id: TenderId) -> AppResult<Arc<TenderMonitor>> {
        let (backend, coordinator, settings) = {
            let guard = self.runtime.read().await;
            let runtime = guard
                .as_ref()
                .ok_or_else(|| AppError::internal("Monitor not initialized"))?;
            (
                runtime.backend.clone(),
                runtime.coordinator.clone(),
                runtime.session_settings,
            )
        };

        let mut sessions = self.sessions.write().await;
        if let Some(previous) = sessions.remove(&tender_id) {
            tracing::debug!(
                tender_id = %tender_id,
                session_id = previous.session_id(),
                "replacing open tender view"
            );
            previous.close().await;
        }

        let monitor = Arc::new(TenderMonitor::open(
            tender_id.clone(),
            backend,
            coordinator,
            settings,
        )?);
        sessions.insert(tender_id, monitor.clone());
        Ok(monitor)
    }

    /// Close the view of `tender_id`. Returns false when none was open.
    pub async fn close(&self, tender_id: &TenderId) -> bool {
        let removed = self.sessions.write().await.remove(tender_id);
        match removed {
            Some(monitor) => {
                monitor.close().await;
                true
            }
            None => false,
        }
    }

    pub async fn close_all(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().map(|(_, m)| m).collect();
        for monitor in sessions {
            monitor.close().await;
        }
    }

    /// Get the open view of `tender_id`
    pub async fn get(&self, tender_id: &TenderId) -> AppResult<Arc<TenderMonitor>> {
        self.sessions
            .read()
            .await
            .get(tender_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No open view for tender '{}'", tender_id)))
    }

    pub async fn open_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a tab key to its section; unmapped keys become `SectionId::Unknown`.
fn parse_section(section_key: &str) -> SectionId {
    SectionId::from_tab_key(section_key.trim())
}

// ============================================================================
// Commands
// ============================================================================

/// Open a tender view and start monitoring its pipeline
pub async fn open_tender_view(
    state: &MonitorState,
    tender_id: String,
) -> CommandResponse<PipelineOverview> {
    let result: AppResult<_> = async {
        let monitor = state.open(TenderId::new(tender_id)).await?;
        Ok(monitor.overview().await)
    }
    .await;
    result.into()
}

/// Close a tender view and stop polling
pub async fn close_tender_view(state: &MonitorState, tender_id: String) -> CommandResponse<bool> {
    CommandResponse::ok(state.close(&TenderId::new(tender_id)).await)
}

/// Get the render model of an open tender view
pub async fn get_pipeline_overview(
    state: &MonitorState,
    tender_id: String,
) -> CommandResponse<PipelineOverview> {
    let result: AppResult<_> = async {
        let monitor = state.get(&TenderId::new(tender_id)).await?;
        Ok(monitor.overview().await)
    }
    .await;
    result.into()
}

/// Get the access decision for one section tab
pub async fn get_section_access(
    state: &MonitorState,
    tender_id: String,
    section_key: String,
) -> CommandResponse<SectionAccess> {
    let result: AppResult<_> = async {
        let monitor = state.get(&TenderId::new(tender_id)).await?;
        Ok(monitor.section_access(parse_section(&section_key)).await)
    }
    .await;
    result.into()
}

/// Switch to a section tab; returns the tab that ends up selected
pub async fn select_section_tab(
    state: &MonitorState,
    tender_id: String,
    section_key: String,
) -> CommandResponse<Option<SectionId>> {
    let result: AppResult<_> = async {
        let monitor = state.get(&TenderId::new(tender_id)).await?;
        Ok(monitor.select_tab(parse_section(&section_key)).await)
    }
    .await;
    result.into()
}

/// Submit a reanalysis of one section
pub async fn request_section_reanalysis(
    state: &MonitorState,
    tender_id: String,
    section_key: String,
) -> CommandResponse<Acknowledgement> {
    let result: AppResult<_> = async {
        let monitor = state.get(&TenderId::new(tender_id)).await?;
        let section = parse_section(&section_key);
        if !section.is_known() {
            return Err(MonitorError::conflict(ConflictReason::UnknownSection(section_key)).into());
        }
        Ok(monitor.request_reanalysis(section).await?)
    }
    .await;
    result.into()
}

/// Fetch the detail payload of an enterable section
pub async fn fetch_section_detail(
    state: &MonitorState,
    tender_id: String,
    section_key: String,
) -> CommandResponse<SectionDetail> {
    let result: AppResult<_> = async {
        let monitor = state.get(&TenderId::new(tender_id)).await?;
        Ok(monitor
            .fetch_section_detail(parse_section(&section_key))
            .await?)
    }
    .await;
    result.into()
}

/// Start the whole analysis pipeline for a tender
pub async fn trigger_full_analysis(
    state: &MonitorState,
    tender_id: String,
) -> CommandResponse<Acknowledgement> {
    let result: AppResult<_> = async {
        let monitor = state.get(&TenderId::new(tender_id)).await?;
        Ok(monitor.trigger_full_analysis().await?)
    }
    .await;
    result.into()
}

/// Ask for a fresh snapshot without waiting for the next poll
pub async fn refresh_pipeline(state: &MonitorState, tender_id: String) -> CommandResponse<bool> {
    let result: AppResult<_> = async {
        let monitor = state.get(&TenderId::new(tender_id)).await?;
        monitor.refresh_now();
        Ok(true)
    }
    .await;
    result.into()
}

/// List every section tab in display order
pub fn list_sections() -> CommandResponse<Vec<SectionDescriptor>> {
    CommandResponse::ok(SectionDescriptor::all())
}
