//! Shop Cache - cache-consistency engine for a shop catalogue
//!
//! Reads go through a key-value cache in front of a primary store using one
//! of three strategies (null-caching pass-through, mutex rebuild, logical
//! expiration); writes update the store and invalidate the cache.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod lock;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{KvCache, MemoryCache};
pub use config::Config;
pub use error::{AppError, Result};
pub use lock::{DistributedLock, LockGuard};
pub use service::{CacheSettings, ReadStrategy, ShopService};
pub use store::{MemoryShopRepository, ShopRepository};
pub use tasks::spawn_cleanup_task;
