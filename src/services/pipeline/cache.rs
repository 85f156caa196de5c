//! Section Detail Cache
//!
//! Read-through cache of section detail payloads for one tender view.
//!
//! - Entries younger than `stale_after` are served without a request.
//! - Older entries are refetched on the next access.
//! - `invalidate` evicts one section immediately, siblings untouched.
//! - Everything is dropped after `retention` regardless (mini-moka TTL).
//!
//! Nothing is refreshed on revisit; only staleness and invalidation cause a
//! refetch.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use mini_moka::sync::{Cache, ConcurrentCacheExt};
use tender_monitor_core::{AnalysisBackend, MonitorError, MonitorResult, SectionId, TenderId};
use tokio::time::{timeout, Instant};

use crate::models::monitor::SectionDetail;
use crate::models::settings::CacheSettings;

#[derive(Debug, Clone)]
struct CachedDetail {
    detail: SectionDetail,
    fetched: Instant,
}

pub struct SectionDetailCache {
    tender_id: TenderId,
    backend: Arc<dyn AnalysisBackend>,
    settings: CacheSettings,
    entries: Cache<SectionId, CachedDetail>,
    /// Bumped on every invalidation so a fetch that started earlier does not
    /// write its now outdated result back.
    epochs: DashMap<SectionId, u64>,
}

impl SectionDetailCache {
    pub fn new(tender_id: TenderId, backend: Arc<dyn AnalysisBackend>, settings: CacheSettings) -> Self {
        let entries = Cache::builder()
            .max_capacity(settings.max_entries)
            .time_to_live(settings.retention)
            .build();

        Self {
            tender_id,
            backend,
            settings,
            entries,
            epochs: DashMap::new(),
        }
    }

    /// Cached detail if still fresh, otherwise a fetch from the backend.
    pub async fn get_or_fetch(&self, section: SectionId) -> MonitorResult<SectionDetail> {
        if let Some(detail) = self.peek(section) {
            tracing::debug!(tender_id = %self.tender_id, section = %section, "section detail cache hit");
            return Ok(detail);
        }

        let remote_name = section.remote_name().ok_or_else(|| {
            MonitorError::validation(format!("section '{}' has no remote counterpart", section))
        })?;

        let epoch = self.epoch(section);
        let timeout_secs = self.settings.request_timeout.as_secs().max(1);
        let payload = timeout(
            self.settings.request_timeout,
            self.backend.section_detail(&self.tender_id, remote_name),
        )
        .await
        .map_err(|_| MonitorError::Timeout(timeout_secs))??;

        let detail = SectionDetail {
            section,
            payload,
            fetched_at: Utc::now(),
        };

        if self.epoch(section) == epoch {
            self.entries.insert(
                section,
                CachedDetail {
                    detail: detail.clone(),
                    fetched: Instant::now(),
                },
            );
        } else {
            tracing::debug!(
                tender_id = %self.tender_id,
                section = %section,
                "section invalidated during fetch, result not cached"
            );
        }

        Ok(detail)
    }

    /// Cached detail only if younger than the staleness window.
    pub fn peek(&self, section: SectionId) -> Option<SectionDetail> {
        self.entries
            .get(&section)
            .filter(|entry| entry.fetched.elapsed() < self.settings.stale_after)
            .map(|entry| entry.detail)
    }

    pub fn contains(&self, section: SectionId) -> bool {
        self.entries.contains_key(&section)
    }

    /// Evict one section's entry.
    pub fn invalidate(&self, section: SectionId) {
        *self.epochs.entry(section).or_insert(0) += 1;
        self.entries.invalidate(&section);
        tracing::debug!(tender_id = %self.tender_id, section = %section, "section detail invalidated");
    }

    pub fn invalidate_all(&self) {
        for section in SectionId::all() {
            *self.epochs.entry(section).or_insert(0) += 1;
        }
        self.entries.invalidate_all();
        self.entries.sync();
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.sync();
        self.entries.entry_count()
    }

    fn epoch(&self, section: SectionId) -> u64 {
        self.epochs.get(&section).map(|e| *e).unwrap_or(0)
    }
}
