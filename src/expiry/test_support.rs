//! An [`EntryStore`] whose failures can be switched on from a test.

use crate::storage::{Entry, EntryStore, StorageEngine, StoreError, Upsert};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub inner: StorageEngine,
    fail_all: AtomicBool,
    fail_deletes: AtomicBool,
    pub sweep_calls: AtomicU64,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, on: bool) {
        self.fail_all.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    /// Leaves the inner store's shard for `key` poisoned, so a sweep hits it
    /// partway through its walk.
    pub fn poison_shard_of(&self, key: &str) -> usize {
        self.inner.poison_shard_of(key)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }

    fn check_delete(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected delete failure".into()));
        }
        Ok(())
    }
}

impl EntryStore for FlakyStore {
    fn fetch(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        self.check()?;
        self.inner.fetch(key)
    }

    fn upsert(
        &self,
        key: &str,
        value: Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Upsert, StoreError> {
        self.check()?;
        self.inner.upsert(key, value, expires_at)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check_delete()?;
        self.inner.delete(key)
    }

    fn delete_expired(&self, key: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        self.check_delete()?;
        self.inner.delete_expired(key, now)
    }

    fn delete_where_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        self.sweep_calls.fetch_add(1, Ordering::SeqCst);
        self.check_delete()?;
        self.inner.delete_where_expired_before(cutoff)
    }

    fn len(&self) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.len()
    }
}
