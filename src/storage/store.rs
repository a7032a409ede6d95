//! The Entry Store contract.
//!
//! The expiration engine talks to storage only through [`EntryStore`].
//! Implementations own durability and atomicity; they apply no expiry policy
//! of their own except where an operation is explicitly conditional on it.

use super::Entry;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Errors raised by an [`EntryStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing storage could not serve the request (transient).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of an [`EntryStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No entry existed for the key
    Created,
    /// An existing entry was replaced
    Updated,
}

impl Upsert {
    /// The word used on the wire for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Upsert::Created => "created",
            Upsert::Updated => "updated",
        }
    }
}

/// Durable mapping from key to [`Entry`].
///
/// Every method must be safe to call concurrently with every other method,
/// including on the same key.
pub trait EntryStore: Send + Sync {
    /// Point lookup. Returns dead entries as-is.
    fn fetch(&self, key: &str) -> Result<Option<Entry>, StoreError>;

    /// Creates the entry, or replaces its value and expiry in one atomic step.
    ///
    /// `created_at` of an existing entry is kept.
    fn upsert(
        &self,
        key: &str,
        value: Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Upsert, StoreError>;

    /// Removes the entry. Returns `false` if there was nothing to remove.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Removes the entry only if it is still logically dead at `now`.
    fn delete_expired(&self, key: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Removes every entry whose expiry is strictly before `cutoff`.
    fn delete_where_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Number of physically stored entries, dead ones included.
    fn len(&self) -> Result<u64, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
