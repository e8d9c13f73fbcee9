//! Shared types for the order key-value service
//!
//! Contains the order record model, the phone normalizer and the
//! process-wide logging setup used by every crate in the workspace.

pub mod errors;
pub mod logging;
pub mod order;
pub mod types;

pub use errors::*;
pub use order::{OrderId, OrderRecord, normalize_phone};
pub use types::InstanceId;
