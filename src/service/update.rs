//! Write-invalidation path: update the primary store, then delete the cache key.

use tracing::{debug, warn};

use super::{ReadStrategy, ShopService};
use crate::error::Result;
use crate::keys;
use crate::models::ShopUpdate;

impl ShopService {
    /// Writes `update` to the primary store and invalidates the cached copy.
    ///
    /// The store write is all-or-nothing and happens first; if it fails the
    /// cache is left untouched. The delete is best effort: a failure is
    /// logged and the stale entry lives until its TTL. No new entry is
    /// written here; the next read repopulates. Under `logical_expire`,
    /// which never repopulates on a miss, a background re-warm is queued.
    pub async fn update(&self, update: ShopUpdate) -> Result<()> {
        let id = update.require_id()?;

        let matched = self.repo.update_by_id(id, &update).await?;
        if !matched {
            debug!(shop_id = id, "update matched no shop");
        }

        let key = keys::shop_key(id);
        match self.cache.delete(&key).await {
            Ok(_) => self.stats.record_invalidation(),
            Err(e) => warn!(shop_id = id, error = %e, "cache invalidation failed"),
        }

        if matched && self.settings.strategy == ReadStrategy::LogicalExpire {
            self.schedule_rewarm(id).await;
        }
        Ok(())
    }

    async fn schedule_rewarm(&self, id: u64) {
        match self.lock.try_acquire(id).await {
            Ok(Some(guard)) => {
                self.scheduler.submit(guard).await;
            }
            Ok(None) => debug!(shop_id = id, "rebuild already in flight"),
            Err(e) => warn!(shop_id = id, error = %e, "could not schedule re-warm"),
        }
    }
}
