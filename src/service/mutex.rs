//! Mutex-guarded rebuild.
//!
//! On a miss only the holder of the shop's rebuild lock queries the store.
//! Everyone else sleeps briefly and starts over from the cache lookup, for at
//! least as long as the lock TTL so a dead holder's lock is always outlived.

use tracing::debug;

use super::{Lookup, ShopService};
use crate::error::{AppError, Result};
use crate::keys;
use crate::models::Shop;

impl ShopService {
    /// Single-flight read: at most one concurrent store query per shop.
    pub async fn query_with_mutex(&self, id: u64) -> Result<Option<Shop>> {
        let key = keys::shop_key(id);
        let budget = self.settings.lock_wait_budget();
        let mut waits: u32 = 0;

        loop {
            // Hit/miss is counted once per read, not once per retry
            let found = if waits == 0 {
                self.lookup(id, &key).await?
            } else {
                self.peek(id, &key).await?
            };
            match found {
                Lookup::Hit(shop) => return Ok(Some(shop)),
                Lookup::Null => return Ok(None),
                Lookup::Miss => {}
            }

            if let Some(guard) = self.lock.try_acquire(id).await? {
                let result = self.rebuild_locked(id, &key).await;
                guard.release_quietly().await;
                return result;
            }

            self.stats.record_lock_contention();
            if waits >= budget {
                return Err(AppError::LockContended { attempts: waits + 1 });
            }
            waits += 1;
            debug!(shop_id = id, attempt = waits, "rebuild lock busy, retrying");
            tokio::time::sleep(self.settings.retry_delay).await;
        }
    }

    /// Runs under the lock. Re-checks the cache first: a previous holder may
    /// have filled it between our miss and our acquisition.
    async fn rebuild_locked(&self, id: u64, key: &str) -> Result<Option<Shop>> {
        match self.peek(id, key).await? {
            Lookup::Hit(shop) => {
                debug!(shop_id = id, "rebuilt by another holder");
                Ok(Some(shop))
            }
            Lookup::Null => Ok(None),
            Lookup::Miss => self.load_and_populate(id, key).await,
        }
    }
}
