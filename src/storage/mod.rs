//! Storage Module
//!
//! This module provides the Entry Store for TTLKV: the single source of
//! truth mapping keys to JSON values with optional expiry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              EntryStore (trait) / StorageEngine             │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!          ▲                                   ▲
//!          │ fetch / upsert / delete_expired   │ delete_where_expired_before
//!   ┌──────┴───────┐                    ┌──────┴───────┐
//!   │ get / put    │                    │ ExpirySweeper│
//!   └──────────────┘                    └──────────────┘
//! ```
//!
//! The store applies no TTL policy on reads; that belongs to
//! [`crate::expiry::ExpirationEngine`].

pub mod engine;
pub mod entry;
pub mod store;

// Re-export commonly used types
pub use engine::{StorageEngine, StorageStats};
pub use entry::{expired_before, is_expired, Entry};
pub use store::{EntryStore, StoreError, Upsert};
