//! Response DTOs for the shop API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::service::{ReadStrategy, StatsSnapshot};

/// Envelope for every shop endpoint: success flag plus data or an error message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    /// Successful result carrying data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error_msg: None,
            data: Some(data),
        }
    }

    /// Successful result with no payload
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            error_msg: None,
            data: None,
        }
    }

    /// Failed result with a message
    pub fn fail(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error_msg: Some(msg.into()),
            data: None,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Configured read strategy
    pub strategy: ReadStrategy,
    /// Key-value cache backend in use
    pub cache_backend: &'static str,
    /// Engine counters
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    /// Share of reads answered from cache (hits, null hits, stale reads)
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from an engine snapshot
    pub fn new(strategy: ReadStrategy, cache_backend: &'static str, counters: StatsSnapshot) -> Self {
        let hit_rate = counters.hit_rate();
        Self {
            strategy,
            cache_backend,
            counters,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
