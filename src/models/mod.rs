//! Data Models
//!
//! Serializable types exchanged with the dashboard and persisted in config.

pub mod monitor;
pub mod response;
pub mod settings;

pub use monitor::*;
pub use response::*;
pub use settings::*;
