//! Background Rebuild Scheduler
//!
//! A fixed pool of worker tasks draining a bounded queue of rebuild jobs.
//! Each job already holds the shop's rebuild lock; the worker reloads the
//! shop from the primary store, writes a fresh logical entry, and releases
//! the lock whatever the outcome.
//!
//! When the queue is full the job is dropped and its lock released at once.
//! Nothing is retried: the next stale read schedules another attempt.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::KvCache;
use crate::codec;
use crate::error::Result;
use crate::keys;
use crate::lock::LockGuard;
use crate::service::EngineStats;
use crate::store::ShopRepository;

// == Cache Rebuilder ==
/// Reloads one shop from the primary store into the cache.
#[derive(Clone)]
pub struct CacheRebuilder {
    cache: Arc<dyn KvCache>,
    repo: Arc<dyn ShopRepository>,
    stats: Arc<EngineStats>,
}

impl CacheRebuilder {
    pub fn new(
        cache: Arc<dyn KvCache>,
        repo: Arc<dyn ShopRepository>,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self { cache, repo, stats }
    }

    /// Writes `{data, expireTime: now + logical_ttl}` with no physical TTL.
    ///
    /// A shop missing from the store has its key removed instead. Returns
    /// whether the shop exists.
    pub async fn rebuild(&self, id: u64, logical_ttl: Duration) -> Result<bool> {
        let key = keys::shop_key(id);
        self.stats.record_store_query();

        match self.repo.get_by_id(id).await? {
            Some(shop) => {
                let raw = codec::encode_with_expiry(&shop, logical_ttl)?;
                self.cache.set(&key, &raw, None).await?;
                debug!(shop_id = id, ttl_secs = logical_ttl.as_secs(), "logical entry written");
                Ok(true)
            }
            None => self.remove_missing(id, &key).await,
        }
    }

    /// Writes the plain shop JSON with a physical TTL, the form the
    /// pass-through and mutex strategies read.
    ///
    /// A shop missing from the store has its key removed instead. Returns
    /// whether the shop exists.
    pub async fn rebuild_plain(&self, id: u64, ttl: Duration) -> Result<bool> {
        let key = keys::shop_key(id);
        self.stats.record_store_query();

        match self.repo.get_by_id(id).await? {
            Some(shop) => {
                let raw = codec::encode(&shop)?;
                self.cache.set(&key, &raw, Some(ttl)).await?;
                debug!(shop_id = id, ttl_secs = ttl.as_secs(), "plain entry written");
                Ok(true)
            }
            None => self.remove_missing(id, &key).await,
        }
    }

    async fn remove_missing(&self, id: u64, key: &str) -> Result<bool> {
        self.cache.delete(key).await?;
        warn!(shop_id = id, "shop no longer in primary store, cache entry removed");
        Ok(false)
    }
}

// == Rebuild Scheduler ==
/// Bounded worker pool for asynchronous cache rebuilds.
pub struct RebuildScheduler {
    sender: Mutex<Option<mpsc::Sender<LockGuard>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<EngineStats>,
}

impl std::fmt::Debug for RebuildScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildScheduler").finish_non_exhaustive()
    }
}

impl RebuildScheduler {
    /// Spawns `workers` worker tasks sharing a queue of `capacity` jobs.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start(
        rebuilder: CacheRebuilder,
        logical_ttl: Duration,
        workers: usize,
        capacity: usize,
        stats: Arc<EngineStats>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let queue = Arc::new(tokio::sync::Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&queue),
                    rebuilder.clone(),
                    logical_ttl,
                    Arc::clone(&stats),
                ))
            })
            .collect();

        info!(workers = workers.max(1), capacity = capacity.max(1), "Rebuild scheduler started");

        Self {
            sender: Mutex::new(Some(tx)),
            workers: tokio::sync::Mutex::new(handles),
            stats,
        }
    }

    /// Queues a rebuild for the shop `guard` locks. Never waits for the rebuild.
    ///
    /// Returns false when the job was rejected; the lock is released before returning.
    pub async fn submit(&self, guard: LockGuard) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(sender) = sender else {
            warn!(shop_id = guard.id(), "rebuild scheduler is shut down, job dropped");
            self.stats.record_rebuild_dropped();
            guard.release_quietly().await;
            return false;
        };

        match sender.try_send(guard) {
            Ok(()) => {
                self.stats.record_rebuild_scheduled();
                true
            }
            Err(TrySendError::Full(guard)) => {
                warn!(shop_id = guard.id(), "rebuild queue full, job dropped");
                self.stats.record_rebuild_dropped();
                guard.release_quietly().await;
                false
            }
            Err(TrySendError::Closed(guard)) => {
                warn!(shop_id = guard.id(), "rebuild workers gone, job dropped");
                self.stats.record_rebuild_dropped();
                guard.release_quietly().await;
                false
            }
        }
    }

    /// Stops accepting jobs, lets workers drain the queue, and waits for them.
    pub async fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let handles: Vec<_> = self.workers.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "rebuild worker ended abnormally");
            }
        }
        info!("Rebuild scheduler stopped");
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<LockGuard>>>,
    rebuilder: CacheRebuilder,
    logical_ttl: Duration,
    stats: Arc<EngineStats>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(guard) = next else {
            break;
        };
        let id = guard.id();

        // Own task so a panicking rebuild surfaces as a JoinError
        let job = {
            let rebuilder = rebuilder.clone();
            tokio::spawn(async move { rebuilder.rebuild(id, logical_ttl).await })
        };

        match job.await {
            Ok(Ok(found)) => {
                stats.record_rebuild_completed();
                debug!(worker, shop_id = id, found, "cache rebuild finished");
            }
            Ok(Err(e)) => {
                stats.record_rebuild_failed();
                error!(worker, shop_id = id, error = %e, "cache rebuild failed");
            }
            Err(e) => {
                stats.record_rebuild_failed();
                error!(worker, shop_id = id, error = %e, "cache rebuild panicked");
            }
        }

        guard.release_quietly().await;
    }
    debug!(worker, "rebuild worker stopped");
}
