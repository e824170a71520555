//! Shop entity and the DTOs of the HTTP surface.

pub mod requests;
pub mod responses;
pub mod shop;

// Re-export commonly used types
pub use requests::{ShopUpdate, WarmParams};
pub use responses::{ApiResult, HealthResponse, StatsResponse};
pub use shop::Shop;
