//! Order record model
//!
//! An order is an open JSON object: a handful of well-known fields
//! (`orderId`, `phone`, `updatedAt`) plus whatever business fields the
//! caller sends. Records are merged field by field, last write wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{SharedError, SharedResult};

pub const ORDER_ID_FIELD: &str = "orderId";
pub const PHONE_FIELD: &str = "phone";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Strip every whitespace character from a phone number.
///
/// Empty input gives an empty string; nothing else is validated.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Trimmed, non-empty order identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Trim `raw`; `None` if nothing is left
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Accept an ID the way request bodies carry it: a string, or a number
    /// rendered in decimal. Anything else counts as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => Self::parse(&n.to_string()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stored order: a flat JSON object
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderRecord(Map<String, Value>);

impl OrderRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Decode a record blob read from the store under `key`
    pub fn from_stored(key: &str, raw: &str) -> SharedResult<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|e| SharedError::MalformedRecord {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(SharedError::NotAnObject {
                key: key.to_string(),
            }),
        }
    }

    /// Encode for storage
    pub fn to_stored(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn order_id(&self) -> Option<&str> {
        self.0.get(ORDER_ID_FIELD).and_then(Value::as_str)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.0.get(UPDATED_AT_FIELD).and_then(Value::as_str)
    }

    /// Phone as stored, if it is a non-empty string or a number
    pub fn phone(&self) -> Option<String> {
        match self.0.get(PHONE_FIELD)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Phone with whitespace removed, used as the index key suffix
    pub fn normalized_phone(&self) -> Option<String> {
        self.phone().map(|p| normalize_phone(&p))
    }

    /// Overlay `patch` onto this record, then force `orderId` and `updatedAt`
    pub fn merged_with(&self, patch: &Map<String, Value>, id: &OrderId, updated_at: &str) -> Self {
        let mut fields = self.0.clone();
        for (field, value) in patch {
            fields.insert(field.clone(), value.clone());
        }
        fields.insert(ORDER_ID_FIELD.to_string(), Value::String(id.to_string()));
        fields.insert(UPDATED_AT_FIELD.to_string(), Value::String(updated_at.to_string()));
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
