//! Request DTOs for the shop API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::Utc;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Shop;

/// Request body for PUT /shop.
///
/// Only the fields present are written; `id` selects the row and is mandatory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopUpdate {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_id: Option<u64>,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub avg_price: Option<u64>,
    #[serde(default)]
    pub sold: Option<u32>,
    #[serde(default)]
    pub comments: Option<u32>,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub open_hours: Option<String>,
}

impl ShopUpdate {
    /// Returns the target id, or a validation error when it is missing.
    pub fn require_id(&self) -> Result<u64> {
        self.id
            .ok_or_else(|| AppError::Validation("shop id must not be empty".to_string()))
    }

    /// Writes every present field onto `shop` and stamps the update time.
    pub fn apply_to(&self, shop: &mut Shop) {
        if let Some(name) = &self.name {
            shop.name = name.clone();
        }
        if let Some(type_id) = self.type_id {
            shop.type_id = type_id;
        }
        if let Some(images) = &self.images {
            shop.images = images.clone();
        }
        if let Some(area) = &self.area {
            shop.area = Some(area.clone());
        }
        if let Some(address) = &self.address {
            shop.address = address.clone();
        }
        if let Some(x) = self.x {
            shop.x = x;
        }
        if let Some(y) = self.y {
            shop.y = y;
        }
        if let Some(avg_price) = self.avg_price {
            shop.avg_price = Some(avg_price);
        }
        if let Some(sold) = self.sold {
            shop.sold = sold;
        }
        if let Some(comments) = self.comments {
            shop.comments = comments;
        }
        if let Some(score) = self.score {
            shop.score = score;
        }
        if let Some(open_hours) = &self.open_hours {
            shop.open_hours = Some(open_hours.clone());
        }
        shop.update_time = Utc::now();
    }
}

/// Query parameters for POST /shop/:id/warm
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarmParams {
    /// TTL override in seconds: logical under `logical_expire`, physical otherwise
    #[serde(default)]
    pub expire_seconds: Option<u64>,
}
