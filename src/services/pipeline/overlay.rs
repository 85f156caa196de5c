//! Optimistic Overlay
//!
//! After a reanalysis is submitted the section should read as `Analyzing`
//! right away, before the next snapshot confirms it. The overlay holds those
//! markers separately from the snapshot. A marker only counts while the
//! snapshot it was written against is still current and its TTL has not run
//! out, so a snapshot that never reflects the restart cannot pin the badge.

use std::collections::HashMap;
use std::time::Duration;

use tender_monitor_core::{AnalysisStatus, SectionId};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Marker {
    generation: u64,
    marked_at: Instant,
}

/// Per-tender set of sections optimistically shown as analyzing.
#[derive(Debug, Clone)]
pub struct OptimisticOverlay {
    ttl: Duration,
    markers: HashMap<SectionId, Marker>,
}

impl OptimisticOverlay {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            markers: HashMap::new(),
        }
    }

    /// Mark `section` as analyzing against snapshot `generation`.
    pub fn mark_analyzing(&mut self, section: SectionId, generation: u64) {
        self.markers.insert(
            section,
            Marker {
                generation,
                marked_at: Instant::now(),
            },
        );
    }

    /// Status override for `section`, if a live marker exists.
    pub fn status_for(&self, section: SectionId, current_generation: u64) -> Option<AnalysisStatus> {
        let marker = self.markers.get(&section)?;
        if marker.generation == current_generation && marker.marked_at.elapsed() < self.ttl {
            Some(AnalysisStatus::Analyzing)
        } else {
            None
        }
    }

    /// Drop markers superseded by `current_generation`.
    pub fn prune(&mut self, current_generation: u64) {
        self.markers
            .retain(|_, marker| marker.generation >= current_generation);
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
