//! Storage Layer
//!
//! Persistent monitor settings. Pipeline state itself is never persisted:
//! the remote service is the source of truth.

pub mod config;

pub use config::ConfigService;
