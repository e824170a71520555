//! Engine Statistics Module
//!
//! Lock-free counters describing how reads were served and how much work
//! reached the primary store.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Engine Stats ==
/// Live counters, shared by the read paths and the rebuild workers.
#[derive(Debug, Default)]
pub struct EngineStats {
    hits: AtomicU64,
    null_hits: AtomicU64,
    stale_reads: AtomicU64,
    misses: AtomicU64,
    decode_errors: AtomicU64,
    store_queries: AtomicU64,
    lock_contentions: AtomicU64,
    rebuilds_scheduled: AtomicU64,
    rebuilds_completed: AtomicU64,
    rebuilds_failed: AtomicU64,
    rebuilds_dropped: AtomicU64,
    invalidations: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh entry served from cache.
    pub fn record_hit(&self) {
        bump(&self.hits);
    }

    /// Null marker served from cache.
    pub fn record_null_hit(&self) {
        bump(&self.null_hits);
    }

    /// Logically expired entry served while a rebuild is pending.
    pub fn record_stale_read(&self) {
        bump(&self.stale_reads);
    }

    pub fn record_miss(&self) {
        bump(&self.misses);
    }

    pub fn record_decode_error(&self) {
        bump(&self.decode_errors);
    }

    pub fn record_store_query(&self) {
        bump(&self.store_queries);
    }

    pub fn record_lock_contention(&self) {
        bump(&self.lock_contentions);
    }

    pub fn record_rebuild_scheduled(&self) {
        bump(&self.rebuilds_scheduled);
    }

    pub fn record_rebuild_completed(&self) {
        bump(&self.rebuilds_completed);
    }

    pub fn record_rebuild_failed(&self) {
        bump(&self.rebuilds_failed);
    }

    pub fn record_rebuild_dropped(&self) {
        bump(&self.rebuilds_dropped);
    }

    pub fn record_invalidation(&self) {
        bump(&self.invalidations);
    }

    // == Snapshot ==
    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            hits: load(&self.hits),
            null_hits: load(&self.null_hits),
            stale_reads: load(&self.stale_reads),
            misses: load(&self.misses),
            decode_errors: load(&self.decode_errors),
            store_queries: load(&self.store_queries),
            lock_contentions: load(&self.lock_contentions),
            rebuilds_scheduled: load(&self.rebuilds_scheduled),
            rebuilds_completed: load(&self.rebuilds_completed),
            rebuilds_failed: load(&self.rebuilds_failed),
            rebuilds_dropped: load(&self.rebuilds_dropped),
            invalidations: load(&self.invalidations),
        }
    }
}

/// Serializable copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub null_hits: u64,
    pub stale_reads: u64,
    pub misses: u64,
    pub decode_errors: u64,
    pub store_queries: u64,
    pub lock_contentions: u64,
    pub rebuilds_scheduled: u64,
    pub rebuilds_completed: u64,
    pub rebuilds_failed: u64,
    pub rebuilds_dropped: u64,
    pub invalidations: u64,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Share of lookups answered from cache without a synchronous store query.
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.null_hits + self.stale_reads;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}
