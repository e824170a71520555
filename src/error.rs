//! Error types for the shop service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResult;

// == App Error Enum ==
/// Unified error type for the engine and its HTTP surface.
#[derive(Error, Debug)]
pub enum AppError {
    /// Shop absent from both cache and primary store
    #[error("shop not found")]
    NotFound(u64),

    /// Rejected input, never retried
    #[error("{0}")]
    Validation(String),

    /// Key-value cache backend failure
    #[error("Cache backend error: {0}")]
    Cache(String),

    /// Primary store failure
    #[error("Primary store error: {0}")]
    Store(String),

    /// Rebuild lock stayed busy for every retry
    #[error("Rebuild lock still held after {attempts} attempts")]
    LockContended { attempts: u32 },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true for the "not found" outcome, which is not a failure of the service.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LockContended { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cache(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ApiResult::<()>::fail(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the shop service.
pub type Result<T> = std::result::Result<T, AppError>;
