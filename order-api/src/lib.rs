//! Order API library
//!
//! HTTP handlers that keep order records in a hosted key-value store,
//! with a set of all order IDs and per-phone secondary indexes.

pub mod config;
pub mod core;
pub mod error;
pub mod server_impl;
pub mod services;
pub mod state;
pub mod traits;
pub mod types;
pub mod web;

// Re-export main types
pub use config::{ServerArgs, Settings, StoreBackend};
pub use crate::core::{KeySchema, OrderIdGenerator, OrderStore, OrderStoreConfig, UpsertOutcome};
pub use error::{ApiError, ApiResult, StoreError, StoreResult};
pub use server_impl::{OrderServer, build_router, shutdown_signal};
pub use state::ApiState;
pub use types::*;

// Re-export trait definitions
pub use traits::{Clock, KvStore, MockClock, MockKvStore};

// Re-export service implementations
pub use services::{InMemoryKvStore, RestKvStore, SystemClock};
