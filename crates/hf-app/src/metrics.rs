//! Engine call counters.

use std::sync::atomic::{AtomicU64, Ordering};

use hf_results::CacheStats;
use serde::{Deserialize, Serialize};

/// Running counters of the work an engine actually performed.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    calculator_calls: AtomicU64,
    detector_calls: AtomicU64,
    store_hits: AtomicU64,
    version_bumps: AtomicU64,
}

impl EngineMetrics {
    pub(crate) fn calculator_called(&self) {
        self.calculator_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn detector_called(&self) {
        self.detector_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store_hit(&self) {
        self.store_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn version_bumped(&self) {
        self.version_bumps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, cache: CacheStats) -> MetricsSnapshot {
        MetricsSnapshot {
            calculator_calls: self.calculator_calls.load(Ordering::Relaxed),
            detector_calls: self.detector_calls.load(Ordering::Relaxed),
            store_hits: self.store_hits.load(Ordering::Relaxed),
            version_bumps: self.version_bumps.load(Ordering::Relaxed),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            cache_entries: cache.entries,
        }
    }
}

/// Point-in-time copy of [`EngineMetrics`] plus cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Pressure-drop calculator invocations.
    pub calculator_calls: u64,
    /// Restriction detector invocations.
    pub detector_calls: u64,
    /// Results served from the persistence hook after a cache miss.
    pub store_hits: u64,
    /// Reloads of an already registered schematic.
    pub version_bumps: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_entries: u64,
}
