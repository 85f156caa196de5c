//! Application State
//!
//! Global state shared by the command handlers. Holds the configuration
//! service; the per-tender monitors live in `commands::monitor::MonitorState`.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::settings::{MonitorConfig, MonitorSettingsUpdate};
use crate::storage::ConfigService;
use crate::utils::error::{AppError, AppResult};

/// Application state shared by all commands
pub struct AppState {
    /// Configuration service for monitor settings
    config: Arc<RwLock<Option<ConfigService>>>,
    /// Whether the state has been initialized
    initialized: Arc<RwLock<bool>>,
}

impl AppState {
    /// Create a new uninitialized app state
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Initialize all services from the default config location
    pub async fn initialize(&self) -> AppResult<()> {
        let mut initialized = self.initialized.write().await;
        if *initialized {
            return Ok(());
        }

        let config = ConfigService::new()?;
        *self.config.write().await = Some(config);

        *initialized = true;
        tracing::info!("application state initialized");
        Ok(())
    }

    /// Initialize with an already constructed config service
    pub async fn initialize_with(&self, config: ConfigService) -> AppResult<()> {
        let mut initialized = self.initialized.write().await;
        *self.config.write().await = Some(config);
        *initialized = true;
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    /// Check if config is healthy
    pub fn is_config_healthy(&self) -> bool {
        if let Ok(guard) = self.config.try_read() {
            if let Some(ref config) = *guard {
                return config.is_healthy();
            }
        }
        false
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> AppResult<MonitorConfig> {
        let guard = self.config.read().await;
        match &*guard {
            Some(config) => Ok(config.get_config_clone()),
            None => Err(AppError::config("Config service not initialized")),
        }
    }

    /// Update the configuration
    pub async fn update_config(&self, update: MonitorSettingsUpdate) -> AppResult<MonitorConfig> {
        let mut guard = self.config.write().await;
        match &mut *guard {
            Some(config) => config.update_config(update),
            None => Err(AppError::config("Config service not initialized")),
        }
    }

    /// Get mutable config service access
    pub async fn with_config_mut<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut ConfigService) -> AppResult<T>,
    {
        let mut guard = self.config.write().await;
        match &mut *guard {
            Some(config) => f(config),
            None => Err(AppError::config("Config service not initialized")),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
