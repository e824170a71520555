//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::service::{CacheSettings, ReadStrategy};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Read algorithm used for every shop lookup
    pub read_strategy: ReadStrategy,
    /// TTL in seconds of a cached shop
    pub cache_ttl: u64,
    /// TTL in seconds of a null marker
    pub null_ttl: u64,
    /// TTL in seconds of a rebuild lock
    pub lock_ttl: u64,
    /// Logical expiry in seconds for preloaded entries
    pub logical_ttl: u64,
    /// Milliseconds between mutex-strategy retries
    pub retry_delay_ms: u64,
    /// Retries before a mutex-strategy read gives up
    pub max_lock_retries: u32,
    /// Rebuild worker count
    pub rebuild_workers: usize,
    /// Pending rebuild jobs allowed before new ones are dropped
    pub rebuild_queue_capacity: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// JSON file seeding the in-memory primary store
    pub shop_data_file: PathBuf,
    /// Preload every shop into the cache at startup
    pub warm_on_startup: bool,
    /// Redis connection URL; in-memory cache when unset
    pub redis_url: Option<String>,
}

/// Parses `name` from the environment, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8081)
    /// - `READ_STRATEGY` - `pass_through`, `mutex` or `logical_expire` (default: mutex)
    /// - `CACHE_TTL_SECS` - Shop entry TTL (default: 1800)
    /// - `NULL_TTL_SECS` - Null marker TTL (default: 120)
    /// - `LOCK_TTL_SECS` - Rebuild lock TTL (default: 10)
    /// - `LOGICAL_TTL_SECS` - Logical expiry (default: 20)
    /// - `RETRY_DELAY_MS` - Lock retry wait (default: 50)
    /// - `MAX_LOCK_RETRIES` - Lock retry cap (default: 100)
    /// - `REBUILD_WORKERS` - Rebuild pool size (default: 10)
    /// - `REBUILD_QUEUE_CAPACITY` - Rebuild backlog (default: 128)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `SHOP_DATA_FILE` - Seed file (default: data/shops.json)
    /// - `WARM_ON_STARTUP` - Preload cache (default: true for logical_expire)
    /// - `REDIS_URL` - Redis cache URL (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read_strategy = env_or("READ_STRATEGY", defaults.read_strategy);

        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            read_strategy,
            cache_ttl: env_or("CACHE_TTL_SECS", defaults.cache_ttl),
            null_ttl: env_or("NULL_TTL_SECS", defaults.null_ttl),
            lock_ttl: env_or("LOCK_TTL_SECS", defaults.lock_ttl),
            logical_ttl: env_or("LOGICAL_TTL_SECS", defaults.logical_ttl),
            retry_delay_ms: env_or("RETRY_DELAY_MS", defaults.retry_delay_ms),
            max_lock_retries: env_or("MAX_LOCK_RETRIES", defaults.max_lock_retries),
            rebuild_workers: env_or("REBUILD_WORKERS", defaults.rebuild_workers),
            rebuild_queue_capacity: env_or(
                "REBUILD_QUEUE_CAPACITY",
                defaults.rebuild_queue_capacity,
            ),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            shop_data_file: env::var("SHOP_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.shop_data_file),
            warm_on_startup: env_or(
                "WARM_ON_STARTUP",
                read_strategy == ReadStrategy::LogicalExpire,
            ),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    /// Engine settings derived from this configuration.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            strategy: self.read_strategy,
            cache_ttl: Duration::from_secs(self.cache_ttl),
            null_ttl: Duration::from_secs(self.null_ttl),
            lock_ttl: Duration::from_secs(self.lock_ttl),
            logical_ttl: Duration::from_secs(self.logical_ttl),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_lock_retries: self.max_lock_retries,
            rebuild_workers: self.rebuild_workers,
            rebuild_queue_capacity: self.rebuild_queue_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8081,
            read_strategy: ReadStrategy::Mutex,
            cache_ttl: 30 * 60,
            null_ttl: 2 * 60,
            lock_ttl: 10,
            logical_ttl: 20,
            retry_delay_ms: 50,
            max_lock_retries: 100,
            rebuild_workers: 10,
            rebuild_queue_capacity: 128,
            cleanup_interval: 1,
            shop_data_file: PathBuf::from("data/shops.json"),
            warm_on_startup: false,
            redis_url: None,
        }
    }
}
