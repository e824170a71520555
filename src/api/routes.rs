//! API Routes
//!
//! Configures the Axum router with all shop endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_shop_handler, health_handler, stats_handler, update_shop_handler, warm_shop_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /shop/:id` - Read a shop through the configured strategy
/// - `PUT /shop` - Update a shop and invalidate its cache entry
/// - `POST /shop/:id/warm` - Preload a shop into the cache
/// - `GET /stats` - Engine counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/shop", put(update_shop_handler))
        .route("/shop/:id", get(get_shop_handler))
        .route("/shop/:id/warm", post(warm_shop_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
