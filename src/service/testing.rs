//! Test doubles for the read strategies.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{KvCache, MemoryCache};
use crate::error::Result;
use crate::keys::LOCK_SHOP_KEY;

/// A [`MemoryCache`] where winning a rebuild lock also writes a value to the
/// matching data key, as if the previous holder finished between the
/// caller's miss and its acquisition.
pub(crate) struct FillOnLockCache {
    inner: MemoryCache,
    fill: Mutex<Option<(String, String)>>,
}

impl FillOnLockCache {
    /// On the next won lock, `key` is set to `value` (no TTL) before the
    /// acquisition returns. Fires once.
    pub(crate) fn new(inner: MemoryCache, key: &str, value: String) -> Self {
        Self {
            inner,
            fill: Mutex::new(Some((key.to_string(), value))),
        }
    }
}

#[async_trait]
impl KvCache for FillOnLockCache {
    fn backend_name(&self) -> &'static str {
        "fill-on-lock"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let won = self.inner.set_if_absent(key, value, ttl).await?;
        if won && key.starts_with(LOCK_SHOP_KEY) {
            let pending = self.fill.lock().unwrap().take();
            if let Some((data_key, payload)) = pending {
                self.inner.set(&data_key, &payload, None).await?;
            }
        }
        Ok(won)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        self.inner.delete_if_equals(key, expected).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.inner.expire(key, ttl).await
    }
}
