//! JSON Configuration Management
//!
//! Handles reading and writing the monitor configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{MonitorConfig, MonitorSettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_tender_monitor_dir};

/// Configuration service for managing monitor settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: MonitorConfig,
}

impl ConfigService {
    /// Create a new config service, loading existing config or creating defaults
    pub fn new() -> AppResult<Self> {
        // Ensure the config directory exists
        ensure_tender_monitor_dir()?;
        Self::with_path(config_path()?)
    }

    /// Create a config service backed by an explicit file path
    pub fn with_path(config_path: PathBuf) -> AppResult<Self> {
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = MonitorConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<MonitorConfig> {
        let content = fs::read_to_string(path)?;
        let config: MonitorConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &MonitorConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> MonitorConfig {
        self.config.clone()
    }

    /// Update the configuration with a partial update.
    ///
    /// An update that fails validation leaves both memory and disk untouched.
    pub fn update_config(&mut self, update: MonitorSettingsUpdate) -> AppResult<MonitorConfig> {
        let mut candidate = self.config.clone();
        candidate.apply_update(update);
        Self::save_to_file(&self.config_path, &candidate)?;
        self.config = candidate;
        Ok(self.config.clone())
    }

    /// Reset configuration to defaults, on disk as well
    pub fn reset(&mut self) -> AppResult<()> {
        let defaults = MonitorConfig::default();
        Self::save_to_file(&self.config_path, &defaults)?;
        self.config = defaults;
        Ok(())
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        self.config_path.exists() && self.config.validate().is_ok()
    }
}
