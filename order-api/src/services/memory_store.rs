//! In-process key-value store
//!
//! Mirrors the Redis semantics the order logic relies on (strings, sets,
//! integer counters, WRONGTYPE errors) behind a single async mutex. Used
//! for local development and tests.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;
use crate::types::{KvCommand, WriteGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Str(String),
    Set(BTreeSet<String>),
}

type Entries = HashMap<String, Entry>;

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct InMemoryKvStore {
    entries: Arc<Mutex<Entries>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently present, sorted
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn read_str<'a>(entries: &'a Entries, key: &str) -> StoreResult<Option<&'a String>> {
        match entries.get(key) {
            None => Ok(None),
            Some(Entry::Str(value)) => Ok(Some(value)),
            Some(Entry::Set(_)) => Err(StoreError::WrongType { key: key.to_string() }),
        }
    }

    fn set_mut<'a>(entries: &'a mut Entries, key: &str) -> StoreResult<&'a mut BTreeSet<String>> {
        match entries.entry(key.to_string()).or_insert_with(|| Entry::Set(BTreeSet::new())) {
            Entry::Set(members) => Ok(members),
            Entry::Str(_) => Err(StoreError::WrongType { key: key.to_string() }),
        }
    }

    fn do_sadd(entries: &mut Entries, key: &str, member: &str) -> StoreResult<bool> {
        Ok(Self::set_mut(entries, key)?.insert(member.to_string()))
    }

    fn do_srem(entries: &mut Entries, key: &str, member: &str) -> StoreResult<bool> {
        let (removed, now_empty) = match entries.get_mut(key) {
            None => return Ok(false),
            Some(Entry::Str(_)) => return Err(StoreError::WrongType { key: key.to_string() }),
            Some(Entry::Set(members)) => (members.remove(member), members.is_empty()),
        };
        // Redis drops a set once its last member is gone
        if now_empty {
            entries.remove(key);
        }
        Ok(removed)
    }

    fn apply(entries: &mut Entries, command: &KvCommand) -> StoreResult<()> {
        match command {
            KvCommand::Set { key, value } => {
                entries.insert(key.clone(), Entry::Str(value.clone()));
            }
            KvCommand::Del { key } => {
                entries.remove(key);
            }
            KvCommand::SAdd { key, member } => {
                Self::do_sadd(entries, key, member)?;
            }
            KvCommand::SRem { key, member } => {
                Self::do_srem(entries, key, member)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(Self::read_str(&entries, key)?.cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), Entry::Str(value.to_string()));
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<u64> {
        let mut entries = self.entries.lock().await;
        Ok(entries.remove(key).map_or(0, |_| 1))
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut entries = self.entries.lock().await;
        let current = match Self::read_str(&entries, key)? {
            None => 0,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| StoreError::NotAnInteger { key: key.to_string() })?,
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::NotAnInteger { key: key.to_string() })?;
        entries.insert(key.to_string(), Entry::Str(next.to_string()));
        Ok(next)
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        Self::do_sadd(&mut entries, key, member)
    }

    async fn srem(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        Self::do_srem(&mut entries, key, member)
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(Entry::Str(_)) => Err(StoreError::WrongType { key: key.to_string() }),
        }
    }

    async fn commit_if_unchanged(&self, guard: WriteGuard, commands: Vec<KvCommand>) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        let current = Self::read_str(&entries, &guard.key)?;
        if current.map(String::as_str) != guard.expected.as_deref() {
            return Ok(false);
        }

        // Stage on a copy so a failing command leaves nothing half-applied
        let mut staged = entries.clone();
        for command in &commands {
            Self::apply(&mut staged, command)?;
        }
        *entries = staged;
        Ok(true)
    }
}
