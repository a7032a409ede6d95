//! HTTP Module
//!
//! The request/response surface of TTLKV. It is a thin layer: parse the
//! body, call the [`crate::expiry::ExpirationEngine`], and map the result
//! onto a status code.
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  axum Router    │  (this module)
//! │  - Parse body   │
//! │  - Map errors   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ExpirationEngine │  (expiry module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  EntryStore     │  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;
pub mod types;

pub use handler::{create_router, serve, AppState, SharedState};
pub use types::ApiError;
