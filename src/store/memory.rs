//! In-memory primary store.
//!
//! Seeds from a JSON array of shops. Carries a query counter plus injectable
//! latency and failure so the engine's consistency guarantees can be
//! observed in tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Shop, ShopUpdate};
use crate::store::ShopRepository;

/// Cloneable in-memory [`ShopRepository`].
#[derive(Debug, Clone, Default)]
pub struct MemoryShopRepository {
    shops: Arc<RwLock<HashMap<u64, Shop>>>,
    queries: Arc<AtomicU64>,
    latency_ms: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl MemoryShopRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `shops`.
    pub fn with_shops(shops: impl IntoIterator<Item = Shop>) -> Self {
        let map = shops.into_iter().map(|shop| (shop.id, shop)).collect();
        Self {
            shops: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    /// Loads shops from a JSON array file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Store(format!("read {}: {e}", path.display())))?;
        let shops: Vec<Shop> = serde_json::from_str(&raw)
            .map_err(|e| AppError::Store(format!("parse {}: {e}", path.display())))?;
        info!(count = shops.len(), path = %path.display(), "Loaded shop seed data");
        Ok(Self::with_shops(shops))
    }

    /// Inserts or replaces a shop.
    pub async fn insert(&self, shop: Shop) {
        self.shops.write().await.insert(shop.id, shop);
    }

    /// Removes a shop.
    pub async fn remove(&self, id: u64) -> Option<Shop> {
        self.shops.write().await.remove(&id)
    }

    /// Number of `get_by_id` calls served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Delay added to every `get_by_id`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Makes every call fail with a store error while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Store("primary store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ShopRepository for MemoryShopRepository {
    async fn get_by_id(&self, id: u64) -> Result<Option<Shop>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        self.check_available()?;
        Ok(self.shops.read().await.get(&id).cloned())
    }

    async fn update_by_id(&self, id: u64, update: &ShopUpdate) -> Result<bool> {
        self.check_available()?;

        // The write guard makes the patch all-or-nothing for readers
        let mut shops = self.shops.write().await;
        match shops.get_mut(&id) {
            Some(shop) => {
                update.apply_to(shop);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_ids(&self) -> Result<Vec<u64>> {
        self.check_available()?;
        let mut ids: Vec<u64> = self.shops.read().await.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
