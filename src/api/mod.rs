//! API Module
//!
//! HTTP handlers and routing for the shop REST API.
//!
//! # Endpoints
//! - `GET /shop/:id` - Read a shop through the cache
//! - `PUT /shop` - Update a shop and invalidate its cache entry
//! - `POST /shop/:id/warm` - Preload a shop into the cache
//! - `GET /stats` - Engine counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
