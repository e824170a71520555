//! Cache key layout.
//!
//! Data entries and rebuild locks live in disjoint namespaces so lock
//! traffic can never overwrite a cached shop.

/// Prefix of cached shop entries.
pub const CACHE_SHOP_KEY: &str = "cache:shop:";

/// Prefix of per-shop rebuild locks.
pub const LOCK_SHOP_KEY: &str = "lock:shop:";

/// Sentinel stored at a shop key when the primary store has no such shop.
pub const NULL_MARKER: &str = "";

/// Cache key for a shop entry.
pub fn shop_key(id: u64) -> String {
    format!("{CACHE_SHOP_KEY}{id}")
}

/// Cache key for a shop's rebuild lock.
pub fn lock_key(id: u64) -> String {
    format!("{LOCK_SHOP_KEY}{id}")
}
