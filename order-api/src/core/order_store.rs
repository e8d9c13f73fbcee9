//! Order records and their indexes
//!
//! Every write is a read-modify-write of `order:<id>` plus index updates.
//! The whole batch is committed with `commit_if_unchanged`, guarded on the
//! raw record that was read, so a concurrent writer forces a re-read
//! instead of leaving a phone index pointing at the wrong order.

use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use shared::{OrderId, OrderRecord, instance_debug, instance_info, instance_warn, normalize_phone};
use std::sync::Arc;

use crate::core::id_generator::OrderIdGenerator;
use crate::core::keys::KeySchema;
use crate::error::{ApiError, ApiResult};
use crate::traits::{Clock, KvStore};
use crate::types::{KvCommand, WriteGuard};

pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tunables for the order store
#[derive(Debug, Clone)]
pub struct OrderStoreConfig {
    pub keys: KeySchema,
    pub id_prefix: String,
    pub max_write_attempts: u32,
}

impl Default for OrderStoreConfig {
    fn default() -> Self {
        Self {
            keys: KeySchema::default(),
            id_prefix: "ORD".to_string(),
            max_write_attempts: 5,
        }
    }
}

/// Result of an upsert
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub id: OrderId,
    pub record: OrderRecord,
    pub created: bool,
}

pub struct OrderStore<K, C> {
    store: Arc<K>,
    clock: Arc<C>,
    keys: KeySchema,
    ids: OrderIdGenerator,
    max_write_attempts: u32,
}

impl<K, C> Clone for OrderStore<K, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            keys: self.keys.clone(),
            ids: self.ids.clone(),
            max_write_attempts: self.max_write_attempts,
        }
    }
}

impl<K, C> OrderStore<K, C>
where
    K: KvStore,
    C: Clock,
{
    pub fn new(store: Arc<K>, clock: Arc<C>, config: OrderStoreConfig) -> Self {
        Self {
            store,
            clock,
            keys: config.keys,
            ids: OrderIdGenerator::new(config.id_prefix),
            max_write_attempts: config.max_write_attempts.max(1),
        }
    }

    /// The underlying key-value store
    pub fn kv(&self) -> &K {
        &self.store
    }

    fn timestamp(&self) -> String {
        self.clock.now().format(UPDATED_AT_FORMAT).to_string()
    }

    fn decode(key: &str, raw: Option<&str>) -> ApiResult<Option<OrderRecord>> {
        raw.map(|r| OrderRecord::from_stored(key, r))
            .transpose()
            .map_err(ApiError::from)
    }

    /// Create or update an order; a missing ID is drawn from today's counter
    pub async fn upsert(&self, requested: Option<OrderId>, patch: Map<String, Value>) -> ApiResult<UpsertOutcome> {
        let id = match requested {
            Some(id) => id,
            None => self.ids.next_id(self.store.as_ref(), self.clock.as_ref(), &self.keys).await?,
        };
        let key = self.keys.record_key(id.as_str());

        for attempt in 1..=self.max_write_attempts {
            let raw = self.store.get(&key).await?;
            let existing = Self::decode(&key, raw.as_deref())?;
            let created = existing.is_none();
            let existing = existing.unwrap_or_default();
            let merged = existing.merged_with(&patch, &id, &self.timestamp());

            let mut commands = vec![
                KvCommand::set(&key, merged.to_stored()?),
                KvCommand::sadd(&self.keys.all_index, id.as_str()),
            ];
            let new_phone = merged.normalized_phone();
            if let Some(old_phone) = existing.normalized_phone() {
                if new_phone.as_ref() != Some(&old_phone) {
                    commands.push(KvCommand::srem(self.keys.phone_index_key(&old_phone), id.as_str()));
                }
            }
            if let Some(phone) = &new_phone {
                commands.push(KvCommand::sadd(self.keys.phone_index_key(phone), id.as_str()));
            }

            if self.store.commit_if_unchanged(WriteGuard::new(&key, raw), commands).await? {
                instance_info!(order_id = %id, created, "📝 Order saved");
                return Ok(UpsertOutcome { id, record: merged, created });
            }
            instance_warn!(order_id = %id, attempt, "⚠️ Order changed during write, retrying");
        }

        Err(ApiError::WriteConflict {
            order_id: id.to_string(),
            attempts: self.max_write_attempts,
        })
    }

    /// Delete an order and evict it from every index; true if it existed
    pub async fn delete(&self, id: &OrderId) -> ApiResult<bool> {
        let key = self.keys.record_key(id.as_str());

        for attempt in 1..=self.max_write_attempts {
            let raw = self.store.get(&key).await?;
            let existed = raw.is_some();
            let existing = Self::decode(&key, raw.as_deref()).unwrap_or_else(|err| {
                instance_warn!(order_id = %id, error = %err, "⚠️ Deleting unreadable record without phone cleanup");
                None
            });

            let mut commands = vec![
                KvCommand::del(&key),
                KvCommand::srem(&self.keys.all_index, id.as_str()),
            ];
            if let Some(phone) = existing.as_ref().and_then(OrderRecord::normalized_phone) {
                commands.push(KvCommand::srem(self.keys.phone_index_key(&phone), id.as_str()));
            }

            if self.store.commit_if_unchanged(WriteGuard::new(&key, raw), commands).await? {
                instance_info!(order_id = %id, existed, "🗑️ Order deleted");
                return Ok(existed);
            }
            instance_warn!(order_id = %id, attempt, "⚠️ Order changed during delete, retrying");
        }

        Err(ApiError::WriteConflict {
            order_id: id.to_string(),
            attempts: self.max_write_attempts,
        })
    }

    /// Fetch one order by raw ID
    pub async fn get(&self, order_id: &str) -> ApiResult<Option<OrderRecord>> {
        let key = self.keys.record_key(order_id);
        let raw = self.store.get(&key).await?;
        Self::decode(&key, raw.as_deref())
    }

    /// Every order referenced by the all-orders index
    pub async fn list_all(&self) -> ApiResult<Vec<OrderRecord>> {
        let ids = self.store.smembers(&self.keys.all_index).await?;
        self.resolve(ids).await
    }

    /// Orders indexed under `raw_phone` after whitespace removal
    pub async fn find_by_phone(&self, raw_phone: &str) -> ApiResult<Vec<OrderRecord>> {
        let phone = normalize_phone(raw_phone);
        let ids = self.store.smembers(&self.keys.phone_index_key(&phone)).await?;
        self.resolve(ids).await
    }

    /// Load records for `ids`, silently dropping any that no longer exist
    async fn resolve(&self, ids: Vec<String>) -> ApiResult<Vec<OrderRecord>> {
        let wanted = ids.len();
        let records = try_join_all(ids.iter().map(|id| self.get(id))).await?;
        let found: Vec<OrderRecord> = records.into_iter().flatten().collect();
        if found.len() < wanted {
            instance_debug!(wanted, found = found.len(), "Index entries without a record were skipped");
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryKvStore;
    use crate::traits::{MockClock, MockKvStore};
    use chrono::NaiveDate;
    use serde_json::json;

    fn fixed_clock() -> Arc<MockClock> {
        let at = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(9, 30, 0).unwrap();
        let mut clock = MockClock::new();
        clock.expect_now().return_const(at);
        Arc::new(clock)
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn id(raw: &str) -> OrderId {
        OrderId::parse(raw).unwrap()
    }

    fn memory_orders() -> (Arc<InMemoryKvStore>, OrderStore<InMemoryKvStore, MockClock>) {
        let kv = Arc::new(InMemoryKvStore::new());
        let orders = OrderStore::new(kv.clone(), fixed_clock(), OrderStoreConfig::default());
        (kv, orders)
    }

    #[tokio::test]
    async fn test_upsert_merges_fields() {
        let (_, orders) = memory_orders();
        let first = orders.upsert(Some(id("X")), patch(json!({"a": 1}))).await.unwrap();
        assert!(first.created);

        let second = orders.upsert(Some(id("X")), patch(json!({"b": 2}))).await.unwrap();
        assert!(!second.created);

        let stored = orders.get("X").await.unwrap().unwrap();
        assert_eq!(stored.get("a"), Some(&json!(1)));
        assert_eq!(stored.get("b"), Some(&json!(2)));
        assert_eq!(stored.order_id(), Some("X"));
        assert_eq!(stored.updated_at(), Some("2024-03-15 09:30:00"));
    }

    #[tokio::test]
    async fn test_upsert_without_id_generates_one() {
        let (kv, orders) = memory_orders();
        let outcome = orders.upsert(None, patch(json!({"item": "tea"}))).await.unwrap();
        assert_eq!(outcome.id.as_str(), "ORD20240315-000001");
        assert_eq!(kv.get("orders:counter:20240315").await.unwrap().as_deref(), Some("1"));
        assert_eq!(kv.smembers("orders:index").await.unwrap(), vec!["ORD20240315-000001"]);
    }

    #[tokio::test]
    async fn test_phone_index_follows_phone_changes() {
        let (kv, orders) = memory_orders();
        orders.upsert(Some(id("X")), patch(json!({"phone": "123 456"}))).await.unwrap();
        assert_eq!(orders.find_by_phone("123456").await.unwrap().len(), 1);
        assert_eq!(orders.find_by_phone(" 123 456 ").await.unwrap().len(), 1);

        orders.upsert(Some(id("X")), patch(json!({"phone": "789"}))).await.unwrap();
        assert!(orders.find_by_phone("123456").await.unwrap().is_empty());
        assert_eq!(orders.find_by_phone("789").await.unwrap()[0].order_id(), Some("X"));
        assert!(!kv.keys().await.contains(&"orders:by_phone:123456".to_string()));
    }

    #[tokio::test]
    async fn test_reformatted_phone_keeps_index_entry() {
        let (kv, orders) = memory_orders();
        orders.upsert(Some(id("X")), patch(json!({"phone": "123 456"}))).await.unwrap();
        orders.upsert(Some(id("X")), patch(json!({"phone": "123456"}))).await.unwrap();
        assert_eq!(kv.smembers("orders:by_phone:123456").await.unwrap(), vec!["X"]);
    }

    #[tokio::test]
    async fn test_clearing_phone_leaves_no_index_entry() {
        let (kv, orders) = memory_orders();
        orders.upsert(Some(id("X")), patch(json!({"phone": "555"}))).await.unwrap();
        orders.upsert(Some(id("X")), patch(json!({"phone": ""}))).await.unwrap();
        assert!(kv.smembers("orders:by_phone:555").await.unwrap().is_empty());
        assert_eq!(kv.smembers("orders:index").await.unwrap(), vec!["X"]);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_cleans_indexes() {
        let (kv, orders) = memory_orders();
        orders.upsert(Some(id("X")), patch(json!({"phone": "1 2 3"}))).await.unwrap();

        assert!(orders.delete(&id("X")).await.unwrap());
        assert!(!orders.delete(&id("X")).await.unwrap());

        assert!(orders.get("X").await.unwrap().is_none());
        assert!(kv.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_reads_skip_dangling_index_entries() {
        let (kv, orders) = memory_orders();
        orders.upsert(Some(id("A")), patch(json!({"phone": "9"}))).await.unwrap();
        kv.sadd("orders:index", "GHOST").await.unwrap();
        kv.sadd("orders:by_phone:9", "GHOST").await.unwrap();

        let all = orders.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(orders.find_by_phone("9").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_record_is_an_error() {
        let (kv, orders) = memory_orders();
        kv.set("order:BAD", "not json").await.unwrap();
        let err = orders.get("BAD").await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_record_can_still_be_deleted() {
        let (kv, orders) = memory_orders();
        kv.set("order:BAD", "[1,2]").await.unwrap();
        kv.sadd("orders:index", "BAD").await.unwrap();
        assert!(orders.list_all().await.is_err());

        assert!(orders.delete(&id("BAD")).await.unwrap());
        assert!(kv.keys().await.is_empty());
        assert!(orders.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_is_retried_then_reported() {
        let mut kv = MockKvStore::new();
        kv.expect_get().times(3).returning(|_| Ok(None));
        kv.expect_commit_if_unchanged().times(3).returning(|_, _| Ok(false));

        let config = OrderStoreConfig { max_write_attempts: 3, ..OrderStoreConfig::default() };
        let orders = OrderStore::new(Arc::new(kv), fixed_clock(), config);
        let err = orders.upsert(Some(id("X")), Map::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::WriteConflict { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_conflict_rereads_latest_record() {
        let mut kv = MockKvStore::new();
        let mut reads = 0;
        kv.expect_get().times(2).returning(move |_| {
            reads += 1;
            if reads == 1 {
                Ok(None)
            } else {
                Ok(Some(r#"{"orderId":"X","phone":"111"}"#.to_string()))
            }
        });
        let mut commits = 0;
        kv.expect_commit_if_unchanged().times(2).returning(move |guard, commands| {
            commits += 1;
            if commits == 1 {
                return Ok(false);
            }
            // Second pass sees the concurrent record and evicts its phone
            assert!(guard.expected.is_some());
            assert!(commands.contains(&KvCommand::srem("orders:by_phone:111", "X")));
            assert!(commands.contains(&KvCommand::sadd("orders:by_phone:222", "X")));
            Ok(true)
        });

        let orders = OrderStore::new(Arc::new(kv), fixed_clock(), OrderStoreConfig::default());
        let outcome = orders.upsert(Some(id("X")), patch(json!({"phone": "222"}))).await.unwrap();
        assert!(!outcome.created);
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_single_phone_entry() {
        let (kv, orders) = memory_orders();
        orders.upsert(Some(id("X")), patch(json!({"phone": "0"}))).await.unwrap();

        let mut tasks = Vec::new();
        for n in 1..=8 {
            let orders = orders.clone();
            tasks.push(tokio::spawn(async move {
                orders.upsert(Some(id("X")), patch(json!({"phone": n.to_string()}))).await
            }));
        }
        for task in tasks {
            // Conflicts may exhaust attempts under heavy contention; that is still consistent
            let _ = task.await.unwrap();
        }

        let record = orders.get("X").await.unwrap().unwrap();
        let phone = record.normalized_phone().unwrap();
        let phone_sets: Vec<String> = kv
            .keys()
            .await
            .into_iter()
            .filter(|k| k.starts_with("orders:by_phone:"))
            .collect();
        assert_eq!(phone_sets, vec![format!("orders:by_phone:{phone}")]);
    }
}
