//! Thread-Safe Storage Engine with an Expiry Index
//!
//! This module implements the in-memory [`EntryStore`] for TTLKV.
//! It is a sharded HashMap of JSON entries, each shard carrying an ordered
//! index of expiry times so bulk expiry never has to scan live keys.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Instead of one big lock, we use multiple shards to reduce contention.
//! 2. **One lock per operation**: every trait method takes exactly one shard lock,
//!    which is what makes upsert and conditional delete atomic.
//! 3. **Expiry Index**: each shard keeps a `BTreeSet<(expires_at, key)>` that is
//!    updated under the same lock as the map.
//! 4. **No global lock**: bulk expiry walks the shards one at a time.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  │ BTreeSet│ │ BTreeSet│ │ BTreeSet│ │ BTreeSet│           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A poisoned shard lock is reported as [`StoreError::Unavailable`] rather
//! than panicking the caller. Bulk expiry is the exception: it takes the
//! poisoned guard anyway, so one bad shard never stops the others from
//! being reclaimed.

use super::entry::{expired_before, is_expired, Entry};
use super::store::{EntryStore, StoreError, Upsert};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Number of shards for the storage engine.
/// More shards = less lock contention, but more memory overhead.
/// 64 is a good balance for most workloads.
const NUM_SHARDS: usize = 64;

/// Contents of one shard. The map and the index only change together.
#[derive(Debug, Default)]
struct ShardData {
    entries: HashMap<String, Entry>,
    by_expiry: BTreeSet<(DateTime<Utc>, String)>,
}

impl ShardData {
    fn index(&mut self, key: &str, expires_at: Option<DateTime<Utc>>) {
        if let Some(exp) = expires_at {
            self.by_expiry.insert((exp, key.to_string()));
        }
    }

    fn unindex(&mut self, key: &str, expires_at: Option<DateTime<Utc>>) {
        if let Some(exp) = expires_at {
            self.by_expiry.remove(&(exp, key.to_string()));
        }
    }

    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.unindex(key, entry.expires_at);
        Some(entry)
    }
}

/// A single shard containing a portion of the entries.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<ShardData>,
}

/// Point-in-time operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of entries currently stored (dead ones included)
    pub keys: u64,
    /// Total fetch operations
    pub fetch_ops: u64,
    /// Total upsert operations
    pub upsert_ops: u64,
    /// Total explicit delete operations
    pub del_ops: u64,
    /// Total dead entries removed, lazily or by a sweep
    pub expired: u64,
}

/// The in-memory entry store.
///
/// This struct is designed to be wrapped in an `Arc` and shared between the
/// request handlers and the expiry sweeper. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use ttlkv::storage::{EntryStore, StorageEngine, Upsert};
/// use serde_json::json;
///
/// let engine = StorageEngine::new();
///
/// assert_eq!(engine.upsert("name", json!("Ariz"), None).unwrap(), Upsert::Created);
/// assert_eq!(engine.upsert("name", json!("Ariz"), None).unwrap(), Upsert::Updated);
///
/// let entry = engine.fetch("name").unwrap().unwrap();
/// assert_eq!(entry.value, json!("Ariz"));
/// ```
pub struct StorageEngine {
    /// Sharded storage for reduced lock contention
    shards: Vec<Shard>,

    /// Statistics: number of stored entries
    key_count: AtomicU64,

    /// Statistics: total fetch operations
    fetch_count: AtomicU64,

    /// Statistics: total upsert operations
    upsert_count: AtomicU64,

    /// Statistics: total explicit deletes
    del_count: AtomicU64,

    /// Statistics: number of expired entries removed
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("key_count", &self.key_count.load(Ordering::Relaxed))
            .field("fetch_count", &self.fetch_count.load(Ordering::Relaxed))
            .field("upsert_count", &self.upsert_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates a new storage engine with default settings.
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            key_count: AtomicU64::new(0),
            fetch_count: AtomicU64::new(0),
            upsert_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Determines which shard a key belongs to.
    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    fn read_shard(&self, idx: usize) -> Result<RwLockReadGuard<'_, ShardData>, StoreError> {
        self.shards[idx]
            .data
            .read()
            .map_err(|_| StoreError::Unavailable(format!("shard {} lock poisoned", idx)))
    }

    fn write_shard(&self, idx: usize) -> Result<RwLockWriteGuard<'_, ShardData>, StoreError> {
        self.shards[idx]
            .data
            .write()
            .map_err(|_| StoreError::Unavailable(format!("shard {} lock poisoned", idx)))
    }

    /// Panics while holding the write lock of `key`'s shard, leaving it
    /// poisoned. Returns the shard index.
    #[cfg(test)]
    pub(crate) fn poison_shard_of(&self, key: &str) -> usize {
        let idx = self.shard_index(key);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.shards[idx].data.write();
            panic!("poisoning shard {}", idx);
        }));
        idx
    }

    /// Returns a snapshot of the operation counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            fetch_ops: self.fetch_count.load(Ordering::Relaxed),
            upsert_ops: self.upsert_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

impl EntryStore for StorageEngine {
    fn fetch(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let data = self.read_shard(self.shard_index(key))?;
        Ok(data.entries.get(key).cloned())
    }

    fn upsert(
        &self,
        key: &str,
        value: Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Upsert, StoreError> {
        self.upsert_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.write_shard(self.shard_index(key))?;

        let previous = data.entries.get(key).map(|e| (e.created_at, e.expires_at));
        let (outcome, created_at) = match previous {
            Some((created_at, old_expiry)) => {
                data.unindex(key, old_expiry);
                (Upsert::Updated, created_at)
            }
            None => (Upsert::Created, Utc::now()),
        };

        data.index(key, expires_at);
        data.entries.insert(
            key.to_string(),
            Entry::new(key, value, created_at, expires_at),
        );

        if outcome == Upsert::Created {
            self.key_count.fetch_add(1, Ordering::Relaxed);
        }

        Ok(outcome)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.write_shard(self.shard_index(key))?;

        if data.remove(key).is_some() {
            self.key_count.fetch_sub(1, Ordering::Relaxed);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn delete_expired(&self, key: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut data = self.write_shard(self.shard_index(key))?;

        // Re-check under the write lock: a put may have landed since the read.
        let dead = data
            .entries
            .get(key)
            .is_some_and(|entry| is_expired(entry.expires_at, now));
        if !dead {
            return Ok(false);
        }

        data.remove(key);
        self.key_count.fetch_sub(1, Ordering::Relaxed);
        self.expired_count.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn delete_where_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut cleaned = 0u64;

        for shard in &self.shards {
            // Index slots without a map entry are skipped below, so whatever a
            // panicking writer left behind is still safe to sweep.
            let mut data = shard.data.write().unwrap_or_else(PoisonError::into_inner);

            // Everything ordered before (cutoff, "") has expires_at < cutoff.
            let live = data.by_expiry.split_off(&(cutoff, String::new()));
            let dead = std::mem::replace(&mut data.by_expiry, live);

            let mut removed = 0u64;
            for (exp, key) in dead {
                debug_assert!(expired_before(Some(exp), cutoff));
                if data.entries.remove(&key).is_some() {
                    removed += 1;
                }
            }

            if removed > 0 {
                self.key_count.fetch_sub(removed, Ordering::Relaxed);
                self.expired_count.fetch_add(removed, Ordering::Relaxed);
                cleaned += removed;
            }
        }

        Ok(cleaned)
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.key_count.load(Ordering::Relaxed))
    }
}
