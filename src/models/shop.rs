//! Shop entity owned by the primary store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shop record. The cache only ever holds a derived copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    /// Immutable identifier
    pub id: u64,
    pub name: String,
    pub type_id: u64,
    /// Comma-separated image URLs
    #[serde(default)]
    pub images: String,
    #[serde(default)]
    pub area: Option<String>,
    pub address: String,
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    #[serde(default)]
    pub avg_price: Option<u64>,
    #[serde(default)]
    pub sold: u32,
    #[serde(default)]
    pub comments: u32,
    /// Rating times ten (e.g. 37 = 3.7 stars)
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub open_hours: Option<String>,
    pub update_time: DateTime<Utc>,
}

impl Shop {
    /// Creates a shop with the given identity and zeroed business counters.
    pub fn new(id: u64, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            type_id: 1,
            images: String::new(),
            area: None,
            address: address.into(),
            x: 0.0,
            y: 0.0,
            avg_price: None,
            sold: 0,
            comments: 0,
            score: 0,
            open_hours: None,
            update_time: Utc::now(),
        }
    }
}
