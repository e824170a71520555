//! API Handlers
//!
//! HTTP request handlers for each shop endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::{AppError, Result};
use crate::models::{ApiResult, HealthResponse, Shop, ShopUpdate, StatsResponse, WarmParams};
use crate::service::ShopService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-consistency engine
    pub service: Arc<ShopService>,
}

impl AppState {
    /// Creates a new AppState around an already built service.
    pub fn new(service: ShopService) -> Self {
        Self::from_shared(Arc::new(service))
    }

    /// Creates a new AppState sharing a service with other owners (e.g. `main`).
    pub fn from_shared(service: Arc<ShopService>) -> Self {
        Self { service }
    }
}

/// Handler for GET /shop/:id
///
/// Reads a shop through the configured read strategy.
pub async fn get_shop_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResult<Shop>>> {
    let shop = state.service.query_by_id(id).await?;
    Ok(Json(ApiResult::ok(shop)))
}

/// Handler for PUT /shop
///
/// Writes to the primary store, then invalidates the cached copy.
pub async fn update_shop_handler(
    State(state): State<AppState>,
    Json(update): Json<ShopUpdate>,
) -> Result<Json<ApiResult<()>>> {
    state.service.update(update).await?;
    Ok(Json(ApiResult::ok_empty()))
}

/// Handler for POST /shop/:id/warm
///
/// Preloads one shop in the entry form the active strategy reads.
pub async fn warm_shop_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Query<WarmParams>,
) -> Result<Json<ApiResult<()>>> {
    let ttl = params.expire_seconds.map(Duration::from_secs);
    if !state.service.warm(id, ttl).await? {
        return Err(AppError::NotFound(id));
    }
    Ok(Json(ApiResult::ok_empty()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let service = &state.service;
    Json(StatsResponse::new(
        service.strategy(),
        service.backend_name(),
        service.stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
