//! Pass-through reads with null caching.
//!
//! A miss falls through to the primary store. Absent shops are remembered as
//! a short-lived null marker so repeated lookups for them stop at the cache.

use tracing::{debug, warn};

use super::{Lookup, ShopService};
use crate::codec;
use crate::error::Result;
use crate::keys::{self, NULL_MARKER};
use crate::models::Shop;

impl ShopService {
    /// Cache, then store; caches whatever the store answered.
    pub async fn query_with_pass_through(&self, id: u64) -> Result<Option<Shop>> {
        let key = keys::shop_key(id);

        match self.lookup(id, &key).await? {
            Lookup::Hit(shop) => Ok(Some(shop)),
            Lookup::Null => Ok(None),
            Lookup::Miss => self.load_and_populate(id, &key).await,
        }
    }

    /// Reads and classifies a plain entry, counting the outcome.
    pub(super) async fn lookup(&self, id: u64, key: &str) -> Result<Lookup> {
        let found = self.peek(id, key).await?;
        match &found {
            Lookup::Hit(_) => {
                self.stats.record_hit();
                debug!(shop_id = id, "cache hit");
            }
            Lookup::Null => {
                self.stats.record_null_hit();
                debug!(shop_id = id, "null marker hit");
            }
            Lookup::Miss => {
                self.stats.record_miss();
                debug!(shop_id = id, "cache miss");
            }
        }
        Ok(found)
    }

    /// Reads and classifies a plain entry without touching hit/miss counters.
    ///
    /// A payload that does not decode is a miss, so the caller rebuilds over it.
    pub(super) async fn peek(&self, id: u64, key: &str) -> Result<Lookup> {
        let Some(raw) = self.cache.get(key).await? else {
            return Ok(Lookup::Miss);
        };
        if raw.trim() == NULL_MARKER {
            return Ok(Lookup::Null);
        }

        match codec::decode(&raw) {
            Ok(shop) => Ok(Lookup::Hit(shop)),
            Err(e) => {
                self.stats.record_decode_error();
                warn!(shop_id = id, error = %e, "discarding undecodable cache entry");
                Ok(Lookup::Miss)
            }
        }
    }

    /// Queries the store and caches the answer: the shop for `cache_ttl`, or
    /// a null marker for `null_ttl`.
    ///
    /// Cache write failures are logged; the store's answer is still returned.
    pub(super) async fn load_and_populate(&self, id: u64, key: &str) -> Result<Option<Shop>> {
        self.stats.record_store_query();

        match self.repo.get_by_id(id).await? {
            Some(shop) => {
                let raw = codec::encode(&shop)?;
                if let Err(e) = self.cache.set(key, &raw, Some(self.settings.cache_ttl)).await {
                    warn!(shop_id = id, error = %e, "failed to cache shop");
                }
                Ok(Some(shop))
            }
            None => {
                if let Err(e) = self
                    .cache
                    .set(key, NULL_MARKER, Some(self.settings.null_ttl))
                    .await
                {
                    warn!(shop_id = id, error = %e, "failed to cache null marker");
                }
                debug!(shop_id = id, "shop absent, null marker cached");
                Ok(None)
            }
        }
    }
}
