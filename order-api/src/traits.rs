//! Service trait definitions for dependency injection
//!
//! All I/O goes through these traits so the order logic can run against
//! the hosted store, the in-memory store, or a mock.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::StoreResult;
use crate::types::{KvCommand, WriteGuard};

/// Key-value store with Redis-style string and set commands
#[mockall::automock]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a string value
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a string value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a key; returns how many keys were removed
    async fn del(&self, key: &str) -> StoreResult<u64>;

    /// Atomically increment an integer counter, creating it at 0
    async fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Add a member to a set; returns true if it was new
    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Remove a member from a set; returns true if it was present
    async fn srem(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// All members of a set (empty when the key is absent)
    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Apply `commands` atomically if `guard` still holds; false on conflict
    async fn commit_if_unchanged(&self, guard: WriteGuard, commands: Vec<KvCommand>) -> StoreResult<bool>;
}

/// Wall clock used for `updatedAt` stamps and daily counters
#[mockall::automock]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}
