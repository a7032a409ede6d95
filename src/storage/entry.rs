//! Stored entries and the expiry predicate.
//!
//! Every path that needs to decide "is this entry dead?" goes through
//! [`is_expired`] or its range form [`expired_before`]. Keeping both next to
//! each other stops the lazy path and the sweeper from drifting apart.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The key this entry is stored under
    pub key: String,
    /// The opaque JSON payload
    pub value: Value,
    /// When this key was first written. Overwrites keep the original.
    pub created_at: DateTime<Utc>,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Creates a new entry stamped with `created_at`.
    pub fn new(
        key: impl Into<String>,
        value: Value,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            created_at,
            expires_at,
        }
    }

    /// Checks if this entry is logically dead at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }

    /// Returns the remaining TTL in whole seconds, or -1 if no expiry.
    ///
    /// Never negative for an entry with an expiry; a dead entry reports 0.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> i64 {
        match self.expires_at {
            None => -1,
            Some(exp) => (exp - now).num_seconds().max(0),
        }
    }
}

/// An entry is logically dead once its expiry is at or before `now`.
#[inline]
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|exp| exp <= now)
}

/// Range form used by bulk deletion: expiry strictly before `cutoff`.
#[inline]
pub fn expired_before(expires_at: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|exp| exp < cutoff)
}
