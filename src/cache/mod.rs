//! Cache Module
//!
//! The key-value cache the engine sits on, seen through [`KvCache`]. Two
//! backends implement it: [`MemoryCache`] (in-process, also the test fake)
//! and, with the `redis` feature, `RedisCache`.

mod entry;
mod memory;
#[cfg(feature = "redis")]
mod redis_impl;
mod store;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
pub use store::CacheStore;

/// String key-value cache shared by every engine component.
///
/// Implementations are shared as `Arc<dyn KvCache>` and may be called from
/// many tasks at once. `set_if_absent` must be atomic: it is the only thing
/// the rebuild lock relies on.
#[async_trait]
pub trait KvCache: Send + Sync + 'static {
    /// Backend name, for logs and `/stats`.
    fn backend_name(&self) -> &'static str;

    /// Returns the value at `key`, or None when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`, with a TTL or permanently.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Stores `value` with `ttl` only if `key` is absent.
    ///
    /// Returns:
    /// - `Ok(true)` if this call stored the value
    /// - `Ok(false)` if the key already existed
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Removes `key`. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes `key` only if it currently holds `expected`, atomically.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool>;

    /// Resets the TTL of an existing key. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
}
