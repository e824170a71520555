//! Background Tasks Module
//!
//! # Tasks
//! - Rebuild scheduler: worker pool refreshing logically expired entries
//! - TTL Cleanup: sweeps expired keys out of the in-memory cache

mod cleanup;
mod rebuild;

pub use cleanup::spawn_cleanup_task;
pub use rebuild::{CacheRebuilder, RebuildScheduler};
