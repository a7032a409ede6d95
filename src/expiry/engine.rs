//! Expiration Engine
//!
//! TTL rules on top of an [`EntryStore`]:
//!
//! - `get` hides logically dead entries and removes them on the spot (lazy expiry)
//! - `put` turns a TTL into an absolute expiry and upserts in one store call
//! - `sweep` bulk-removes everything that died before now (active expiry)
//!
//! The engine holds no entries of its own. Every call re-reads the store, so
//! there is nothing that can go stale between a write and a read.

use crate::storage::{EntryStore, StoreError, Upsert};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Span};

/// Longest key accepted by `put`.
pub const MAX_KEY_LEN: usize = 255;

/// Errors surfaced by the [`ExpirationEngine`].
///
/// A missing or expired key is not an error; `get` reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The caller sent something the engine refuses to store
    #[error("{0}")]
    InvalidInput(String),

    /// The store failed; never retried inside the engine
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// A live entry as seen by a reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub key: String,
    pub value: Value,
    /// Whole seconds left, or -1 when the entry never expires
    pub ttl_remaining: i64,
}

/// What a `put` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    pub action: Upsert,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Enforces TTL semantics for every read, write and sweep.
///
/// Cheap to share: wrap it in an `Arc` and hand clones to the HTTP layer and
/// the sweeper.
pub struct ExpirationEngine {
    store: Arc<dyn EntryStore>,
    /// Diagnostics for this engine are parented here
    span: Span,
}

impl std::fmt::Debug for ExpirationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationEngine").finish_non_exhaustive()
    }
}

impl ExpirationEngine {
    /// Creates an engine over `store`.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            span: info_span!("expiry"),
        }
    }

    /// Routes this engine's diagnostics to `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Looks up a key, applying lazy expiry.
    ///
    /// Returns `Ok(None)` for both absent and expired keys. A dead entry is
    /// removed before returning; if that cleanup fails the failure is logged
    /// and the answer is still `None`.
    pub fn get(&self, key: &str) -> Result<Option<Hit>, EngineError> {
        let now = Utc::now();

        let Some(entry) = self.store.fetch(key)? else {
            return Ok(None);
        };

        if entry.is_expired_at(now) {
            match self.store.delete_expired(key, now) {
                Ok(removed) => {
                    debug!(parent: &self.span, key, removed, "Key unusable due to expiration")
                }
                Err(e) => {
                    warn!(parent: &self.span, key, error = %e, "Lazy expiry cleanup failed")
                }
            }
            return Ok(None);
        }

        Ok(Some(Hit {
            ttl_remaining: entry.ttl_remaining(now),
            key: entry.key,
            value: entry.value,
        }))
    }

    /// Creates or replaces a key.
    ///
    /// `ttl_seconds` of `None` or `Some(0)` stores the value without expiry.
    /// A JSON `null` value is rejected.
    pub fn put(
        &self,
        key: &str,
        value: Value,
        ttl_seconds: Option<u64>,
    ) -> Result<PutOutcome, EngineError> {
        validate_key(key)?;
        if value.is_null() {
            return Err(EngineError::InvalidInput(
                "Missing value in payload".to_string(),
            ));
        }

        let expires_at = expiry_from_ttl(Utc::now(), ttl_seconds)?;
        let action = self.store.upsert(key, value, expires_at)?;

        debug!(
            parent: &self.span,
            key,
            action = action.as_str(),
            expires_at = ?expires_at,
            "Stored key"
        );

        Ok(PutOutcome { action, expires_at })
    }

    /// Removes a key regardless of its expiry. Absent keys are not an error.
    pub fn delete(&self, key: &str) -> Result<bool, EngineError> {
        let removed = self.store.delete(key)?;
        debug!(parent: &self.span, key, removed, "Deleted key");
        Ok(removed)
    }

    /// Removes every entry that expired before now and returns how many.
    pub fn sweep(&self) -> Result<u64, EngineError> {
        Ok(self.store.delete_where_expired_before(Utc::now())?)
    }

    /// Number of stored entries, including dead ones not yet reclaimed.
    pub fn stored_keys(&self) -> Result<u64, EngineError> {
        Ok(self.store.len()?)
    }
}

fn validate_key(key: &str) -> Result<(), EngineError> {
    if key.is_empty() {
        return Err(EngineError::InvalidInput("Key must not be empty".to_string()));
    }
    if key.chars().count() > MAX_KEY_LEN {
        return Err(EngineError::InvalidInput(format!(
            "Key longer than {} characters",
            MAX_KEY_LEN
        )));
    }
    Ok(())
}

/// Converts a relative TTL into an absolute expiry. Zero means "no TTL".
fn expiry_from_ttl(
    now: DateTime<Utc>,
    ttl_seconds: Option<u64>,
) -> Result<Option<DateTime<Utc>>, EngineError> {
    match ttl_seconds {
        None | Some(0) => Ok(None),
        Some(secs) => i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .map(Some)
            .ok_or_else(|| EngineError::InvalidInput(format!("ttl {} is out of range", secs))),
    }
}
