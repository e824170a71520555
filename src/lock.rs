//! Distributed Lock
//!
//! Per-shop mutual exclusion built on the cache's `set_if_absent`. The lock
//! key carries a short TTL so a holder that dies never blocks rebuilds for
//! longer than that TTL. Each acquisition stores a fresh UUID and release is
//! compare-and-delete, so a holder whose lock already expired cannot remove
//! the lock of whoever acquired it next.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::KvCache;
use crate::error::Result;
use crate::keys;

/// Rebuild lock over a shared [`KvCache`].
#[derive(Clone)]
pub struct DistributedLock {
    cache: Arc<dyn KvCache>,
    ttl: Duration,
}

impl std::fmt::Debug for DistributedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLock")
            .field("backend", &self.cache.backend_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl DistributedLock {
    pub fn new(cache: Arc<dyn KvCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Attempts to become the holder of `lock:shop:<id>`.
    ///
    /// Returns `Ok(None)` when someone else holds it; that is contention, not an error.
    pub async fn try_acquire(&self, id: u64) -> Result<Option<LockGuard>> {
        let key = keys::lock_key(id);
        let value = Uuid::new_v4().to_string();

        if !self.cache.set_if_absent(&key, &value, self.ttl).await? {
            return Ok(None);
        }

        debug!(shop_id = id, "rebuild lock acquired");
        Ok(Some(LockGuard {
            lock: self.clone(),
            held: Some(Held { id, key, value }),
        }))
    }

    async fn release_held(&self, held: &Held) -> Result<bool> {
        let released = self.cache.delete_if_equals(&held.key, &held.value).await?;
        if released {
            debug!(shop_id = held.id, "rebuild lock released");
        } else {
            warn!(
                shop_id = held.id,
                "rebuild lock expired before release; it may belong to another holder now"
            );
        }
        Ok(released)
    }
}

#[derive(Debug)]
struct Held {
    id: u64,
    key: String,
    value: String,
}

/// Proof of holding the rebuild lock for one shop.
///
/// Release it with [`release`](Self::release). A guard dropped without being
/// released (early return, cancelled request, panicking job) schedules the
/// release on the current Tokio runtime; outside a runtime the lock TTL
/// clears it.
#[derive(Debug)]
pub struct LockGuard {
    lock: DistributedLock,
    held: Option<Held>,
}

impl LockGuard {
    /// Shop the lock guards.
    pub fn id(&self) -> u64 {
        self.held.as_ref().map(|h| h.id).unwrap_or_default()
    }

    /// Cache key holding the lock.
    pub fn key(&self) -> &str {
        self.held.as_ref().map(|h| h.key.as_str()).unwrap_or_default()
    }

    /// Releases the lock if this guard still owns it.
    ///
    /// Returns false when the lock had already expired or changed hands.
    pub async fn release(mut self) -> Result<bool> {
        match self.held.take() {
            Some(held) => self.lock.release_held(&held).await,
            None => Ok(false),
        }
    }

    /// Release for exit paths that must not fail: errors are logged and swallowed.
    pub async fn release_quietly(self) {
        let id = self.id();
        if let Err(e) = self.release().await {
            warn!(shop_id = id, error = %e, "failed to release rebuild lock");
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let Some(held) = self.held.take() else {
            return;
        };
        let lock = self.lock.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = lock.release_held(&held).await {
                    warn!(shop_id = held.id, error = %e, "failed to release dropped rebuild lock");
                }
            });
        }
    }
}
