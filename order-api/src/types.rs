//! Type definitions for the order API
//!
//! Store commands, request query parameters and the response envelopes.

use serde::{Deserialize, Serialize};
use shared::{OrderId, OrderRecord};

/// A single write applied as part of an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvCommand {
    Set { key: String, value: String },
    Del { key: String },
    SAdd { key: String, member: String },
    SRem { key: String, member: String },
}

impl KvCommand {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set { key: key.into(), value: value.into() }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Self::Del { key: key.into() }
    }

    pub fn sadd(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SAdd { key: key.into(), member: member.into() }
    }

    pub fn srem(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SRem { key: key.into(), member: member.into() }
    }

    /// Redis-style argument vector, command name first
    pub fn to_args(&self) -> Vec<String> {
        match self {
            KvCommand::Set { key, value } => vec!["SET".into(), key.clone(), value.clone()],
            KvCommand::Del { key } => vec!["DEL".into(), key.clone()],
            KvCommand::SAdd { key, member } => vec!["SADD".into(), key.clone(), member.clone()],
            KvCommand::SRem { key, member } => vec!["SREM".into(), key.clone(), member.clone()],
        }
    }
}

/// Optimistic-lock guard: the batch only applies while `key` still holds
/// `expected` (`None` = key must still be absent)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteGuard {
    pub key: String,
    pub expected: Option<String>,
}

impl WriteGuard {
    pub fn new(key: impl Into<String>, expected: Option<String>) -> Self {
        Self { key: key.into(), expected }
    }
}

/// Query string accepted by the orders route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub order_id: Option<String>,
    pub phone: Option<String>,
    pub list: Option<String>,
}

/// Which read the query string asks for, in precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSelector {
    All,
    ById(String),
    ByPhone(String),
}

impl OrderQuery {
    /// `list=true` beats `orderId` beats `phone`; empty values are ignored
    /// and `orderId` is trimmed the same way writes trim it
    pub fn selector(&self) -> Option<OrderSelector> {
        if self.list.as_deref() == Some("true") {
            return Some(OrderSelector::All);
        }
        if let Some(id) = self.order_id.as_deref().and_then(OrderId::parse) {
            return Some(OrderSelector::ById(id.to_string()));
        }
        self.phone
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|p| OrderSelector::ByPhone(p.to_string()))
    }
}

/// Body of `GET ?list=true`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListing {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<OrderRecord>,
}

impl OrderListing {
    pub fn new(items: Vec<OrderRecord>) -> Self {
        Self { ok: true, count: items.len(), items }
    }
}

/// Body of a successful upsert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReply {
    pub ok: bool,
    pub order_id: String,
    pub order: OrderRecord,
}

/// Body of a successful delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReply {
    pub ok: bool,
    pub deleted: String,
}

/// Query string of the key-value probe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeQuery {
    pub action: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
}
