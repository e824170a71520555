//! Cache Entry Codec
//!
//! Shops are cached as JSON strings. The logical-expiration read path wraps
//! them together with their logical expiry:
//!
//! ```text
//! {"data":{...shop...},"expireTime":"2024-05-01T12:00:20Z"}
//! ```
//!
//! Callers treat every [`DecodeError`] as a cache miss.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::error::{AppError, Result};
use crate::models::Shop;

/// Failure to read a cached payload back into a shop.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Empty or whitespace-only payload (includes the null marker)
    #[error("payload is blank")]
    Blank,

    /// Payload is not the expected JSON shape
    #[error("invalid payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

// == Logical Entry ==
/// A shop plus the instant after which it is logically stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalEntry {
    pub data: Shop,
    pub expire_time: DateTime<Utc>,
}

impl LogicalEntry {
    /// Stale once the current time reaches `expire_time`. The entry stays readable.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expire_time
    }
}

/// Serializes a shop for a plain cache entry.
pub fn encode(shop: &Shop) -> Result<String> {
    serde_json::to_string(shop).map_err(|e| AppError::Internal(format!("encode shop: {e}")))
}

/// Wraps a shop with `expireTime = now + ttl`.
pub fn encode_with_expiry(shop: &Shop, ttl: Duration) -> Result<String> {
    let ttl = ChronoDuration::from_std(ttl)
        .map_err(|e| AppError::Internal(format!("logical ttl out of range: {e}")))?;
    encode_wrapped_at(shop, Utc::now() + ttl)
}

/// Wraps a shop with an explicit logical expiry.
pub fn encode_wrapped_at(shop: &Shop, expire_time: DateTime<Utc>) -> Result<String> {
    let entry = LogicalEntry {
        data: shop.clone(),
        expire_time,
    };
    serde_json::to_string(&entry).map_err(|e| AppError::Internal(format!("encode entry: {e}")))
}

/// Parses a plain cache entry.
pub fn decode(raw: &str) -> std::result::Result<Shop, DecodeError> {
    if raw.trim().is_empty() {
        return Err(DecodeError::Blank);
    }
    Ok(serde_json::from_str(raw)?)
}

/// Parses a wrapped cache entry.
pub fn decode_wrapped(raw: &str) -> std::result::Result<LogicalEntry, DecodeError> {
    if raw.trim().is_empty() {
        return Err(DecodeError::Blank);
    }
    Ok(serde_json::from_str(raw)?)
}
