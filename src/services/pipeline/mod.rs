//! Analysis Pipeline Monitoring
//!
//! Tracks the remote analysis pipeline of one tender per open view:
//! - `client` - HTTP `AnalysisBackend`
//! - `poller` - background snapshot polling
//! - `state` / `overlay` - the per-tender aggregate
//! - `cache` - section detail read-through cache
//! - `reanalysis` - single-flight reanalysis submission
//! - `session` - `TenderMonitor`, tying the above together

mod cache;
mod client;
mod overlay;
mod poller;
mod reanalysis;
mod session;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::*;
pub use client::*;
pub use overlay::*;
pub use poller::*;
pub use reanalysis::*;
pub use session::*;
pub use state::*;
