//! In-process result cache with TTL and hit/miss tracking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{CacheKey, CachedResult};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum entry count.
pub const DEFAULT_CAPACITY: u64 = 10_000;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Memoisation of operation results.
///
/// Entries expire after the TTL. Stale versions are never served because the
/// version is part of [`CacheKey`]; [`ResultCache::purge_schematic`] only
/// frees their memory early.
pub struct ResultCache {
    cache: Cache<CacheKey, Arc<CachedResult>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self {
            cache,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<CachedResult>> {
        match self.cache.get(key) {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache hit");
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache miss");
                None
            }
        }
    }

    /// Insert, replacing any existing entry; last write wins.
    pub fn insert(&self, key: CacheKey, value: CachedResult) -> Arc<CachedResult> {
        let value = Arc::new(value);
        self.cache.insert(key, Arc::clone(&value));
        value
    }

    /// Cached value for `key`, or the result of `compute` stored under it.
    ///
    /// Errors from `compute` are returned and nothing is cached.
    pub fn get_or_try_compute<E>(
        &self,
        key: CacheKey,
        compute: impl FnOnce() -> Result<CachedResult, E>,
    ) -> Result<Arc<CachedResult>, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        Ok(self.insert(key, compute()?))
    }

    /// Drop every entry of `schematic_id` not at `current_version`.
    pub fn purge_schematic(&self, schematic_id: &str, current_version: u64) -> usize {
        self.cache.run_pending_tasks();
        let stale: Vec<CacheKey> = self
            .cache
            .iter()
            .filter(|(k, _)| k.schematic_id == schematic_id && k.version != current_version)
            .map(|(k, _)| k.as_ref().clone())
            .collect();
        for key in &stale {
            self.cache.invalidate(key);
        }
        if !stale.is_empty() {
            debug!(schematic = schematic_id, purged = stale.len(), "stale cache entries purged");
        }
        stale.len()
    }

    /// Lifetime of an entry; persisted results older than this are not reused.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}
