//! Commands
//!
//! Entry points the dashboard calls. Every command returns a
//! `CommandResponse` envelope; errors are reported as strings.

pub mod health;
pub mod init;
pub mod monitor;
pub mod settings;

pub use health::*;
pub use init::*;
pub use monitor::*;
pub use settings::*;
