//! HTTP Handler Module
//!
//! Maps HTTP requests onto the [`ExpirationEngine`]. Handlers hold no state
//! of their own beyond the shared engine; every request re-reads the store.
//!
//! ## Routes
//!
//! - `GET /kv/{key}` - Read a key (404 when absent or expired)
//! - `PUT /kv/{key}`, `POST /kv/{key}` - Create or replace a key
//! - `DELETE /kv/{key}` - Remove a key
//! - `GET /health` - Uptime, key count and sweeper counters

use super::types::{
    ApiError, DeleteResponse, GetResponse, HealthResponse, PutRequest, PutResponse,
};
use crate::expiry::{EngineError, ExpirationEngine, SweeperStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared state for the HTTP server
pub struct AppState {
    pub engine: Arc<ExpirationEngine>,
    pub sweeper: Arc<SweeperStats>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<ExpirationEngine>, sweeper: Arc<SweeperStats>) -> Self {
        Self {
            engine,
            sweeper,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/kv/{key}",
            get(get_key).put(put_key).post(put_key).delete(delete_key),
        )
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Storage failures are logged here, with the key, before the details are
/// dropped from the response.
fn engine_error(key: &str, op: &'static str, err: EngineError) -> ApiError {
    if let EngineError::Storage(e) = &err {
        error!(key, op, error = %e, "Storage failure");
    }
    ApiError::from(err)
}

async fn get_key(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    match state.engine.get(&key) {
        Ok(Some(hit)) => Ok(Json(hit.into())),
        Ok(None) => Err(ApiError::NotFound),
        Err(e) => Err(engine_error(&key, "get", e)),
    }
}

async fn put_key(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<PutResponse>), ApiError> {
    let request = PutRequest::parse(&body)?;
    let ttl = request.ttl_seconds()?;

    let outcome = state
        .engine
        .put(&key, request.value, ttl)
        .map_err(|e| engine_error(&key, "put", e))?;

    Ok((StatusCode::CREATED, Json(PutResponse::new(key, outcome))))
}

async fn delete_key(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state
        .engine
        .delete(&key)
        .map_err(|e| engine_error(&key, "delete", e))?;

    Ok(Json(DeleteResponse {
        status: "ok",
        key,
        deleted,
    }))
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    let keys = state
        .engine
        .stored_keys()
        .map_err(|e| engine_error("", "health", e))?;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
        uptime_secs,
        keys,
        sweeper: state.sweeper.snapshot(),
    }))
}
