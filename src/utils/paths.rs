//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Handles ~/.tender-monitor/.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (~/.tender-monitor/)
pub fn tender_monitor_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".tender-monitor"))
}

/// Get the config file path (~/.tender-monitor/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(tender_monitor_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the application directory, creating it if it doesn't exist
pub fn ensure_tender_monitor_dir() -> AppResult<PathBuf> {
    let path = tender_monitor_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
