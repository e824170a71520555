//! Shop Service
//!
//! The cache-consistency engine. Reads go through one configured
//! [`ReadStrategy`]; writes go through the invalidation path in `update`.
//!
//! | Strategy | Miss handling | Protects against |
//! |---|---|---|
//! | `pass_through` | query store, cache result or null marker | penetration |
//! | `mutex` | single-flight rebuild under the shop lock, others wait and retry | penetration, breakdown |
//! | `logical_expire` | serve stale, rebuild in background | breakdown, without blocking |

mod logical_expire;
mod mutex;
mod pass_through;
mod stats;
mod update;

#[cfg(test)]
mod testing;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::cache::KvCache;
use crate::error::{AppError, Result};
use crate::lock::DistributedLock;
use crate::models::Shop;
use crate::store::ShopRepository;
use crate::tasks::{CacheRebuilder, RebuildScheduler};

pub use stats::{EngineStats, StatsSnapshot};

// == Read Strategy ==
/// Algorithm used by [`ShopService::query_by_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    PassThrough,
    Mutex,
    LogicalExpire,
}

impl FromStr for ReadStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pass_through" => Ok(Self::PassThrough),
            "mutex" => Ok(Self::Mutex),
            "logical_expire" => Ok(Self::LogicalExpire),
            other => Err(AppError::Validation(format!("unknown read strategy '{other}'"))),
        }
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PassThrough => "pass_through",
            Self::Mutex => "mutex",
            Self::LogicalExpire => "logical_expire",
        };
        f.write_str(name)
    }
}

// == Cache Settings ==
/// Timing and sizing knobs of the engine.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub strategy: ReadStrategy,
    /// Physical TTL of a plain shop entry
    pub cache_ttl: Duration,
    /// Physical TTL of a null marker; much shorter than `cache_ttl`
    pub null_ttl: Duration,
    /// Rebuild lock fuse
    pub lock_ttl: Duration,
    /// Logical TTL written into wrapped entries
    pub logical_ttl: Duration,
    /// Wait between mutex-strategy attempts
    pub retry_delay: Duration,
    /// Waits allowed before the mutex strategy gives up; raised to
    /// [`lock_wait_budget`](Self::lock_wait_budget) when shorter than the lock TTL
    pub max_lock_retries: u32,
    pub rebuild_workers: usize,
    pub rebuild_queue_capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            strategy: ReadStrategy::Mutex,
            cache_ttl: Duration::from_secs(30 * 60),
            null_ttl: Duration::from_secs(2 * 60),
            lock_ttl: Duration::from_secs(10),
            logical_ttl: Duration::from_secs(20),
            retry_delay: Duration::from_millis(50),
            max_lock_retries: 100,
            rebuild_workers: 10,
            rebuild_queue_capacity: 128,
        }
    }
}

impl CacheSettings {
    /// Waits a mutex-strategy read makes before giving up.
    ///
    /// Never less than what it takes for `lock_ttl` to run out, so a holder
    /// that died is always outlived and its lock taken over.
    pub fn lock_wait_budget(&self) -> u32 {
        let delay_ms = self.retry_delay.as_millis();
        if delay_ms == 0 {
            return self.max_lock_retries;
        }
        let covering = self.lock_ttl.as_millis().div_ceil(delay_ms) + 1;
        self.max_lock_retries
            .max(u32::try_from(covering).unwrap_or(u32::MAX))
    }
}

/// Result of inspecting a plain shop entry.
#[derive(Debug)]
enum Lookup {
    Hit(Shop),
    Null,
    Miss,
}

// == Shop Service ==
/// Read/write entry point wired to a cache, a primary store, and a rebuild pool.
pub struct ShopService {
    cache: Arc<dyn KvCache>,
    repo: Arc<dyn ShopRepository>,
    lock: DistributedLock,
    rebuilder: CacheRebuilder,
    scheduler: RebuildScheduler,
    settings: CacheSettings,
    stats: Arc<EngineStats>,
}

impl fmt::Debug for ShopService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopService")
            .field("backend", &self.cache.backend_name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ShopService {
    /// Builds the engine and starts its rebuild workers.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(
        cache: Arc<dyn KvCache>,
        repo: Arc<dyn ShopRepository>,
        settings: CacheSettings,
    ) -> Self {
        let stats = Arc::new(EngineStats::new());
        let lock = DistributedLock::new(Arc::clone(&cache), settings.lock_ttl);
        let rebuilder = CacheRebuilder::new(Arc::clone(&cache), Arc::clone(&repo), Arc::clone(&stats));
        let scheduler = RebuildScheduler::start(
            rebuilder.clone(),
            settings.logical_ttl,
            settings.rebuild_workers,
            settings.rebuild_queue_capacity,
            Arc::clone(&stats),
        );

        info!(
            strategy = %settings.strategy,
            backend = cache.backend_name(),
            "Shop service initialized"
        );

        Self {
            cache,
            repo,
            lock,
            rebuilder,
            scheduler,
            settings,
            stats,
        }
    }

    pub fn strategy(&self) -> ReadStrategy {
        self.settings.strategy
    }

    pub fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == Query By Id ==
    /// Reads a shop through the configured strategy.
    ///
    /// Fails with [`AppError::NotFound`] when the shop does not exist (or,
    /// under `logical_expire`, was never preloaded).
    pub async fn query_by_id(&self, id: u64) -> Result<Shop> {
        let shop = match self.settings.strategy {
            ReadStrategy::PassThrough => self.query_with_pass_through(id).await?,
            ReadStrategy::Mutex => self.query_with_mutex(id).await?,
            ReadStrategy::LogicalExpire => self.query_with_logical_expire(id).await?,
        };
        shop.ok_or(AppError::NotFound(id))
    }

    // == Warm ==
    /// Preloads a shop in the entry form the configured strategy reads.
    /// Returns whether it exists.
    ///
    /// Under `logical_expire` the entry is wrapped with `ttl` (default
    /// `logical_ttl`) as its logical expiry. Otherwise it is a plain entry
    /// whose physical TTL is `ttl` (default `cache_ttl`).
    pub async fn warm(&self, id: u64, ttl: Option<Duration>) -> Result<bool> {
        match self.settings.strategy {
            ReadStrategy::LogicalExpire => {
                let ttl = ttl.unwrap_or(self.settings.logical_ttl);
                self.rebuilder.rebuild(id, ttl).await
            }
            ReadStrategy::PassThrough | ReadStrategy::Mutex => {
                let ttl = ttl.unwrap_or(self.settings.cache_ttl);
                self.rebuilder.rebuild_plain(id, ttl).await
            }
        }
    }

    /// Preloads every shop in the primary store. Returns how many were written.
    pub async fn warm_all(&self) -> Result<usize> {
        let ids = self.repo.list_ids().await?;
        let mut warmed = 0;
        for id in ids {
            if self.warm(id, None).await? {
                warmed += 1;
            }
        }
        info!(warmed, "Cache preloaded");
        Ok(warmed)
    }

    /// Closes the rebuild queue and waits for in-flight rebuilds.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
