//! Order ID generation
//!
//! IDs look like `ORD20240315-000042`: a prefix, the calendar date, and a
//! six-digit sequence taken from the store's per-day counter. Uniqueness
//! rests entirely on the store's atomic INCR; a write that fails after the
//! increment leaves a gap in the sequence.

use shared::OrderId;

use crate::core::keys::KeySchema;
use crate::error::{StoreError, StoreResult};
use crate::traits::{Clock, KvStore};

#[derive(Debug, Clone)]
pub struct OrderIdGenerator {
    prefix: String,
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new("ORD")
    }
}

impl OrderIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Render an ID for `date` (YYYYMMDD) and sequence number `seq`
    pub fn format(&self, date: &str, seq: i64) -> String {
        format!("{}{}-{:06}", self.prefix, date, seq)
    }

    /// Draw the next ID for today
    pub async fn next_id<K, C>(&self, store: &K, clock: &C, keys: &KeySchema) -> StoreResult<OrderId>
    where
        K: KvStore + ?Sized,
        C: Clock + ?Sized,
    {
        let date = clock.now().format("%Y%m%d").to_string();
        let counter_key = keys.counter_key(&date);
        let seq = store.incr(&counter_key).await?;
        let raw = self.format(&date, seq);
        OrderId::parse(&raw).ok_or_else(|| StoreError::unexpected("INCR", format!("unusable order id {raw:?}")))
    }
}
