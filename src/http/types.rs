//! Request and response bodies for the HTTP API, plus the error type
//! every handler returns.

use crate::expiry::{EngineError, Hit, PutOutcome, SweeperSnapshot};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `PUT`/`POST /kv/{key}`.
///
/// A missing `value` deserializes to `Value::Null` and is rejected by the
/// engine. `ttl` is taken as signed so negative numbers get a clear message.
#[derive(Debug, Deserialize)]
pub struct PutRequest {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<i64>,
}

impl PutRequest {
    /// Parses a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let invalid = |e: serde_json::Error| ApiError::InvalidInput(format!("Invalid JSON: {}", e));

        let raw: Value = serde_json::from_slice(body).map_err(invalid)?;
        if !raw.is_object() {
            return Err(ApiError::InvalidInput(
                "Request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(raw).map_err(invalid)
    }

    /// The TTL in seconds, rejecting negative values.
    pub fn ttl_seconds(&self) -> Result<Option<u64>, ApiError> {
        match self.ttl {
            None => Ok(None),
            Some(secs) => u64::try_from(secs).map(Some).map_err(|_| {
                ApiError::InvalidInput("ttl must be a non-negative integer".to_string())
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
    pub ttl_remaining: i64,
}

impl From<Hit> for GetResponse {
    fn from(hit: Hit) -> Self {
        Self {
            key: hit.key,
            value: hit.value,
            ttl_remaining: hit.ttl_remaining,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PutResponse {
    pub status: &'static str,
    pub action: &'static str,
    pub key: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PutResponse {
    pub fn new(key: String, outcome: PutOutcome) -> Self {
        Self {
            status: "ok",
            action: outcome.action.as_str(),
            key,
            expires_at: outcome.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub key: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub keys: u64,
    pub sweeper: SweeperSnapshot,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Everything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Absent or expired key; the two are indistinguishable to clients
    #[error("Key could not be found")]
    NotFound,

    /// Malformed body or rejected input
    #[error("{0}")]
    InvalidInput(String),

    /// Storage failed; details are logged, not returned
    #[error("Internal Server Error")]
    Internal,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            EngineError::Storage(_) => ApiError::Internal,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}
