//! Primary Store Module
//!
//! The durable source of truth for shops, seen through [`ShopRepository`].

mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Shop, ShopUpdate};

pub use memory::MemoryShopRepository;

/// Keyed access to the primary shop store.
#[async_trait]
pub trait ShopRepository: Send + Sync + 'static {
    /// Loads a shop. `Ok(None)` means confirmed absent.
    async fn get_by_id(&self, id: u64) -> Result<Option<Shop>>;

    /// Applies the present fields of `update` to shop `id` as one unit:
    /// either every field is written or none is.
    ///
    /// Returns whether a shop with that id existed.
    async fn update_by_id(&self, id: u64, update: &ShopUpdate) -> Result<bool>;

    /// Every shop id, used to preload the cache.
    async fn list_ids(&self) -> Result<Vec<u64>>;
}
