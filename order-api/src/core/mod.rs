//! Core order logic
//!
//! Key naming, ID generation and the record/index maintenance that keeps
//! `orders:index` and the per-phone sets in step with the records.

pub mod id_generator;
pub mod keys;
pub mod order_store;

pub use id_generator::OrderIdGenerator;
pub use keys::KeySchema;
pub use order_store::{OrderStore, OrderStoreConfig, UpsertOutcome};
