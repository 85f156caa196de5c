//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions; pipeline errors come from
//! the core crate and are wrapped unchanged.

use thiserror::Error;
use tender_monitor_core::MonitorError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Analysis pipeline errors (network, malformed snapshot, conflicts)
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The wrapped pipeline error, if any
    pub fn as_monitor(&self) -> Option<&MonitorError> {
        match self {
            AppError::Monitor(err) => Some(err),
            _ => None,
        }
    }
}

/// Convert AppError to a string suitable for command responses
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
