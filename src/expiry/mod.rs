//! Expiry Module
//!
//! TTL enforcement for TTLKV. Keys with a TTL are expired in two ways:
//!
//! 1. **Lazy**: [`ExpirationEngine::get`] hides a dead entry and deletes it
//! 2. **Active**: [`ExpirySweeper`] periodically calls [`ExpirationEngine::sweep`]
//!
//! ```text
//!   HTTP handlers                     ExpirySweeper
//!   (get / put / delete)              (Background Tokio Task)
//!          │                                 │
//!          ▼                                 ▼
//!   ┌──────────────────────────────────────────────┐
//!   │              ExpirationEngine                │
//!   └──────────────────────┬───────────────────────┘
//!                          ▼
//!                    EntryStore
//! ```

pub mod engine;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use engine::{EngineError, ExpirationEngine, Hit, PutOutcome, MAX_KEY_LEN};
pub use sweeper::{
    start_expiry_sweeper, ExpirySweeper, SweeperConfig, SweeperSnapshot, SweeperStats,
};
