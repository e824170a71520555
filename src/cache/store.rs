//! Cache Store Module
//!
//! Single-threaded key-value map with millisecond TTLs and lazy expiry.
//! [`MemoryCache`](super::MemoryCache) shares it across tasks.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::entry::{current_timestamp_ms, deadline_after};
use crate::cache::CacheEntry;

// == Cache Store ==
/// Key-value storage with the operations the engine needs from a cache server.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
}

impl CacheStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Live Lookup ==
    /// Returns the entry if present and not expired, dropping it if it has expired.
    fn live_entry(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let now = current_timestamp_ms();
        if self.entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }

    // == Get ==
    /// Retrieves a value by key. Expired entries read as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.live_entry(key).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores a value, replacing any previous value and TTL.
    pub fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) {
        self.entries
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
    }

    // == Set If Absent ==
    /// Stores a value only when no live entry exists. Returns true if stored.
    pub fn set_if_absent(&mut self, key: &str, value: &str, ttl: Duration) -> bool {
        if self.live_entry(key).is_some() {
            return false;
        }
        self.set(key, value, Some(ttl));
        true
    }

    // == Delete ==
    /// Removes an entry. Returns true if a live entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let existed = self.live_entry(key).is_some();
        self.entries.remove(key);
        existed
    }

    // == Delete If Equals ==
    /// Removes an entry only if its current value equals `expected`.
    pub fn delete_if_equals(&mut self, key: &str, expected: &str) -> bool {
        let owned = self
            .live_entry(key)
            .is_some_and(|entry| entry.value == expected);
        if owned {
            self.entries.remove(key);
        }
        owned
    }

    // == Expire ==
    /// Resets the TTL of a live entry. Returns false if the key is absent.
    pub fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        match self.live_entry(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline_after(ttl));
                true
            }
            None => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
