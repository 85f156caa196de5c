//! Tender Monitor Core
//!
//! Domain types and pure decisions for the tender analysis-pipeline monitor.
//! This crate has zero dependencies on application-level code (HTTP client,
//! timers, caches, configuration files).
//!
//! ## Module Organization
//!
//! - `error` - Monitor error taxonomy (`MonitorError`, `MonitorResult`)
//! - `section` - `TenderId`, `SectionId` and the section lookup table
//! - `status` - `AnalysisStatus` and the two prerequisite `Stage`s
//! - `snapshot` - Validated pipeline `Snapshot` and its wire format
//! - `gate` - Stage gate, access gate and progress-view phase
//! - `backend` - `AnalysisBackend` trait for the remote service
//!
//! ## Design Principles
//!
//! 1. **No I/O** - everything here is synchronous and deterministic
//! 2. **Fail closed** - inconsistent reports are rejected, never guessed at
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod backend;
pub mod error;
pub mod gate;
pub mod section;
pub mod snapshot;
pub mod status;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{ConflictReason, MonitorError, MonitorResult};

// ── Identifiers ────────────────────────────────────────────────────────
pub use section::{SectionId, SectionSpec, TenderId, SECTION_TABLE};

// ── Status & Snapshot ──────────────────────────────────────────────────
pub use snapshot::{Progress, RawSnapshot, RawStages, Snapshot};
pub use status::{AnalysisStatus, Stage};

// ── Gates ──────────────────────────────────────────────────────────────
pub use gate::{can_enter, section_work_visible, select_tab, AccessBadge, PipelinePhase, SectionAccess};

// ── Backend Contract ───────────────────────────────────────────────────
pub use backend::{Acknowledgement, AnalysisBackend};
