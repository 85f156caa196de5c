//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by commands.

pub mod pipeline;

pub use pipeline::{
    HttpAnalysisBackend, PollerHandle, ReanalysisCoordinator, SectionDetailCache, SnapshotObserver,
    SnapshotPoller, TenderMonitor,
};
