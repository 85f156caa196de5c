//! Settings Models
//!
//! Monitor configuration and the derived per-service settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Monitor configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Base URL of the analysis service API
    pub api_base_url: String,
    /// Seconds between snapshot polls while the pipeline is unsettled
    pub poll_interval_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Age after which a cached section detail is refetched
    pub detail_stale_after_secs: u64,
    /// Age after which a cached section detail is dropped outright
    pub detail_retention_secs: u64,
    /// Lifetime of an optimistic "analyzing" marker without a new snapshot
    #[serde(default = "default_overlay_ttl_secs")]
    pub overlay_ttl_secs: u64,
    /// Maximum number of section details kept per tender view
    #[serde(default = "default_max_cached_sections")]
    pub max_cached_sections: u64,
}

fn default_overlay_ttl_secs() -> u64 {
    15
}

fn default_max_cached_sections() -> u64 {
    64
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            poll_interval_secs: 7,
            request_timeout_secs: 30,
            detail_stale_after_secs: 5 * 60,
            detail_retention_secs: 30 * 60,
            overlay_ttl_secs: default_overlay_ttl_secs(),
            max_cached_sections: default_max_cached_sections(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonitorSettingsUpdate {
    pub api_base_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub detail_stale_after_secs: Option<u64>,
    pub detail_retention_secs: Option<u64>,
    pub overlay_ttl_secs: Option<u64>,
    pub max_cached_sections: Option<u64>,
}

/// Poller timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        MonitorConfig::default().poll_settings()
    }
}

/// Section detail cache windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub stale_after: Duration,
    pub retention: Duration,
    pub max_entries: u64,
    pub request_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        MonitorConfig::default().cache_settings()
    }
}

/// Reanalysis coordinator timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub request_timeout: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        MonitorConfig::default().coordinator_settings()
    }
}

/// Everything one tender view needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub poll: PollSettings,
    pub cache: CacheSettings,
    pub overlay_ttl: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        MonitorConfig::default().session_settings()
    }
}

impl MonitorConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: MonitorSettingsUpdate) {
        if let Some(url) = update.api_base_url {
            self.api_base_url = url;
        }
        if let Some(interval) = update.poll_interval_secs {
            self.poll_interval_secs = interval;
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(stale) = update.detail_stale_after_secs {
            self.detail_stale_after_secs = stale;
        }
        if let Some(retention) = update.detail_retention_secs {
            self.detail_retention_secs = retention;
        }
        if let Some(ttl) = update.overlay_ttl_secs {
            self.overlay_ttl_secs = ttl;
        }
        if let Some(max) = update.max_cached_sections {
            self.max_cached_sections = max;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.api_base_url)
            .map_err(|e| format!("Invalid api_base_url '{}': {}", self.api_base_url, e))?;
        if !["http", "https"].contains(&url.scheme()) {
            return Err(format!(
                "Invalid api_base_url scheme: {}. Must be 'http' or 'https'",
                url.scheme()
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be at least 1 second".to_string());
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err("request_timeout_secs must be between 1 and 300".to_string());
        }

        if self.detail_stale_after_secs == 0 {
            return Err("detail_stale_after_secs must be at least 1 second".to_string());
        }

        if self.detail_retention_secs < self.detail_stale_after_secs {
            return Err("detail_retention_secs cannot be shorter than detail_stale_after_secs".to_string());
        }

        if self.max_cached_sections == 0 {
            return Err("max_cached_sections must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            stale_after: Duration::from_secs(self.detail_stale_after_secs),
            retention: Duration::from_secs(self.detail_retention_secs),
            max_entries: self.max_cached_sections,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            poll: self.poll_settings(),
            cache: self.cache_settings(),
            overlay_ttl: Duration::from_secs(self.overlay_ttl_secs),
        }
    }
}
