//! # TTLKV - A JSON Key-Value Store with Time-To-Live
//!
//! TTLKV maps string keys to arbitrary JSON values, each optionally carrying
//! a TTL. Entries silently disappear once their TTL elapses.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               TTLKV                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐             │
//! │  │ HTTP Server │───>│ axum Router │───>│ ExpirationEngine │             │
//! │  │ (Listener)  │    │  handlers   │    │  get/put/sweep   │             │
//! │  └─────────────┘    └─────────────┘    └────────┬─────────┘             │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                     ┌──────────────────────────────────────────────┐   │
//! │                     │              StorageEngine                   │   │
//! │                     │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │                     │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! │                                                 ▲                       │
//! │                                                 │                       │
//! │                     ┌───────────────────────────┴─────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use ttlkv::expiry::{ExpirationEngine, ExpirySweeper, SweeperConfig};
//! use ttlkv::http::{serve, AppState};
//! use ttlkv::storage::StorageEngine;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let store = Arc::new(StorageEngine::new());
//!     let engine = Arc::new(ExpirationEngine::new(store));
//!
//!     // Start the background expiry sweeper
//!     let sweeper = ExpirySweeper::start(Arc::clone(&engine), SweeperConfig::default());
//!
//!     let state = Arc::new(AppState::new(engine, sweeper.stats()));
//!     let listener = TcpListener::bind("127.0.0.1:8000").await?;
//!     serve(listener, state, async { tokio::signal::ctrl_c().await.ok(); }).await?;
//!
//!     sweeper.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The Entry Store contract and its sharded in-memory engine
//! - [`expiry`]: TTL enforcement (lazy on read, active via the sweeper)
//! - [`http`]: The axum request/response surface
//!
//! ## Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: When a key is read, a dead entry is hidden and deleted
//! 2. **Active**: A background task periodically bulk-deletes dead entries
//!
//! Both paths decide death with the same predicate, [`storage::is_expired`].

pub mod expiry;
pub mod http;
pub mod storage;

// Re-export commonly used types for convenience
pub use expiry::{start_expiry_sweeper, ExpirationEngine, ExpirySweeper, SweeperConfig};
pub use storage::{EntryStore, StorageEngine};

/// The default port TTLKV listens on
pub const DEFAULT_PORT: u16 = 8000;

/// The default host TTLKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of TTLKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
