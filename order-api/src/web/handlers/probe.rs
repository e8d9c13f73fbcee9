//! Key-value connectivity probe - /api/kv-test
//!
//! `?action=set&key=foo&value=bar` writes then reads back a raw key,
//! `?action=get&key=foo` reads it. Only mounted when enabled at startup.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde_json::{Value, json};
use shared::instance_info;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;
use crate::traits::{Clock, KvStore};
use crate::types::ProbeQuery;

pub const PROBE_USAGE: &str = "Usage: /api/kv-test?action=set|get&key=<k>&value=<v>";

pub async fn kv_probe<K, C>(
    State(state): State<Arc<ApiState<K, C>>>,
    headers: HeaderMap,
    Query(query): Query<ProbeQuery>,
) -> ApiResult<Json<Value>>
where
    K: KvStore + 'static,
    C: Clock + 'static,
{
    state.authorize(&headers)?;

    let (Some(action), Some(key)) = (
        query.action.filter(|a| !a.is_empty()),
        query.key.filter(|k| !k.is_empty()),
    ) else {
        return Err(ApiError::validation(PROBE_USAGE));
    };
    let kv = state.orders.kv();

    match action.as_str() {
        "set" => {
            let value = query.value.unwrap_or_default();
            kv.set(&key, &value).await?;
            let got = kv.get(&key).await?;
            instance_info!(key = %key, "🔧 Probe wrote key");
            Ok(Json(json!({ "ok": true, "action": action, "key": key, "saved": value, "got": got })))
        }
        "get" => {
            let got = kv.get(&key).await?;
            Ok(Json(json!({ "ok": true, "action": action, "key": key, "got": got })))
        }
        _ => Err(ApiError::validation("action must be set or get")),
    }
}
