//! Logical-expiration reads.
//!
//! Entries carry their own `expireTime` and have no physical TTL, so a hot
//! shop never disappears from the cache. A reader that finds an expired entry
//! returns it anyway; the first such reader to take the lock hands a rebuild
//! to the background scheduler. Readers never wait on the primary store.
//!
//! Assumes the cache was preloaded: a missing entry reads as not found.

use tracing::{debug, warn};

use super::ShopService;
use crate::codec::{self, LogicalEntry};
use crate::error::Result;
use crate::keys;
use crate::models::Shop;

impl ShopService {
    /// Non-blocking read; stale data is served while a rebuild is in flight.
    pub async fn query_with_logical_expire(&self, id: u64) -> Result<Option<Shop>> {
        let key = keys::shop_key(id);

        let Some(entry) = self.peek_logical(id, &key).await? else {
            self.stats.record_miss();
            debug!(shop_id = id, "no preloaded entry");
            return Ok(None);
        };

        if !entry.is_expired() {
            self.stats.record_hit();
            return Ok(Some(entry.data));
        }

        let Some(guard) = self.lock.try_acquire(id).await? else {
            // Someone else is already rebuilding
            self.stats.record_lock_contention();
            self.stats.record_stale_read();
            return Ok(Some(entry.data));
        };

        // Re-check: the previous holder may have refreshed it after our read
        if let Some(fresh) = self
            .peek_logical(id, &key)
            .await?
            .filter(|e| !e.is_expired())
        {
            guard.release_quietly().await;
            self.stats.record_hit();
            debug!(shop_id = id, "entry refreshed by another holder");
            return Ok(Some(fresh.data));
        }

        debug!(shop_id = id, "entry logically expired, scheduling rebuild");
        self.scheduler.submit(guard).await;
        self.stats.record_stale_read();
        Ok(Some(entry.data))
    }

    /// Reads a wrapped entry. Blank or undecodable payloads read as absent.
    async fn peek_logical(&self, id: u64, key: &str) -> Result<Option<LogicalEntry>> {
        let Some(raw) = self.cache.get(key).await? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        match codec::decode_wrapped(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                self.stats.record_decode_error();
                warn!(shop_id = id, error = %e, "undecodable logical entry treated as absent");
                Ok(None)
            }
        }
    }
}
