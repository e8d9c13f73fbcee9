//! Hosted key-value store client
//!
//! Speaks the REST protocol of Upstash / Vercel KV: each command is POSTed
//! to the base URL as a JSON array (`["SADD", "orders:index", "X"]`) with a
//! bearer token, and the reply is `{"result": ...}` or `{"error": "..."}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;
use crate::types::{KvCommand, WriteGuard};

/// Compare the guard key, then run the packed commands in one step.
///
/// ARGV layout: `absent-flag, expected, (argc, args...)*`.
///
/// Tests only check that `encode_guarded_batch` matches this layout; the
/// fake endpoint replays the batch itself, so the Lua is never executed.
/// A Redis error partway through leaves earlier commands applied.
pub(crate) const GUARDED_BATCH_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if ARGV[1] == '1' then
  if current then return 0 end
elseif current ~= ARGV[2] then
  return 0
end
local i = 3
while i <= #ARGV do
  local n = tonumber(ARGV[i])
  redis.call(unpack(ARGV, i + 1, i + n))
  i = i + n + 1
end
return 1
"#;

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Pack a guarded batch into EVAL arguments
pub(crate) fn encode_guarded_batch(guard: &WriteGuard, commands: &[KvCommand]) -> Vec<String> {
    let mut args = vec![
        "EVAL".to_string(),
        GUARDED_BATCH_SCRIPT.to_string(),
        "1".to_string(),
        guard.key.clone(),
    ];
    match &guard.expected {
        None => {
            args.push("1".to_string());
            args.push(String::new());
        }
        Some(expected) => {
            args.push("0".to_string());
            args.push(expected.clone());
        }
    }
    for command in commands {
        let command_args = command.to_args();
        args.push(command_args.len().to_string());
        args.extend(command_args);
    }
    args
}

/// Real key-value store client over HTTPS
#[derive(Clone)]
pub struct RestKvStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl RestKvStore {
    /// Create a client for `base_url`, failing each request after `timeout`
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify(&self, error: reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            StoreError::Transport(error)
        }
    }

    /// Send one command and return its `result`
    async fn command(&self, args: Vec<String>) -> StoreResult<Value> {
        let name = args.first().cloned().unwrap_or_default();
        tracing::trace!(command = %name, "kv request");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let reply: RestReply = match response.json().await {
            Ok(reply) => reply,
            Err(e) if status.is_success() => return Err(StoreError::unexpected(&name, e.to_string())),
            Err(_) => return Err(Self::http_failure(status)),
        };

        if let Some(message) = reply.error {
            return Err(StoreError::Remote { message });
        }
        if !status.is_success() {
            return Err(Self::http_failure(status));
        }
        Ok(reply.result.unwrap_or(Value::Null))
    }

    fn http_failure(status: StatusCode) -> StoreError {
        StoreError::Remote {
            message: format!("HTTP {status}"),
        }
    }

    fn as_integer(command: &str, value: &Value) -> StoreResult<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| StoreError::unexpected(command, format!("non-integer {n}"))),
            Value::String(s) => s
                .parse()
                .map_err(|_| StoreError::unexpected(command, format!("non-integer {s:?}"))),
            other => Err(StoreError::unexpected(command, format!("expected integer, got {other}"))),
        }
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.command(vec!["GET".into(), key.into()]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        match self.command(vec!["SET".into(), key.into(), value.into()]).await? {
            Value::String(s) if s == "OK" => Ok(()),
            other => Err(StoreError::unexpected("SET", other.to_string())),
        }
    }

    async fn del(&self, key: &str) -> StoreResult<u64> {
        let reply = self.command(vec!["DEL".into(), key.into()]).await?;
        Ok(Self::as_integer("DEL", &reply)?.max(0) as u64)
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let reply = self.command(vec!["INCR".into(), key.into()]).await?;
        Self::as_integer("INCR", &reply)
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        let reply = self.command(vec!["SADD".into(), key.into(), member.into()]).await?;
        Ok(Self::as_integer("SADD", &reply)? > 0)
    }

    async fn srem(&self, key: &str, member: &str) -> StoreResult<bool> {
        let reply = self.command(vec!["SREM".into(), key.into(), member.into()]).await?;
        Ok(Self::as_integer("SREM", &reply)? > 0)
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        match self.command(vec!["SMEMBERS".into(), key.into()]).await? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(StoreError::unexpected("SMEMBERS", format!("member {other}"))),
                })
                .collect(),
            other => Err(StoreError::unexpected("SMEMBERS", other.to_string())),
        }
    }

    async fn commit_if_unchanged(&self, guard: WriteGuard, commands: Vec<KvCommand>) -> StoreResult<bool> {
        let reply = self.command(encode_guarded_batch(&guard, &commands)).await?;
        Ok(Self::as_integer("EVAL", &reply)? == 1)
    }
}
