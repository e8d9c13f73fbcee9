//! Order endpoints - /orders and /api/orders
//!
//! Reads by `orderId` or `phone` are public; listing everything and all
//! writes need the admin token.

use axum::{
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Map, Value};
use shared::{OrderId, instance_debug, order::ORDER_ID_FIELD};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;
use crate::traits::{Clock, KvStore};
use crate::types::{DeleteReply, OrderListing, OrderQuery, OrderSelector, UpsertReply};

/// Decode a request body as a JSON object; an empty body is `{}`
pub fn parse_object_body(body: &[u8]) -> ApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::validation("body must be a JSON object")),
        Err(e) => Err(ApiError::validation(format!("invalid JSON body: {e}"))),
    }
}

fn query_or_reject(query: Result<Query<OrderQuery>, QueryRejection>) -> ApiResult<OrderQuery> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::validation(e.body_text()))
}

/// GET - list, lookup by ID, or lookup by phone
pub async fn query_orders<K, C>(
    State(state): State<Arc<ApiState<K, C>>>,
    headers: HeaderMap,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> ApiResult<Response>
where
    K: KvStore + 'static,
    C: Clock + 'static,
{
    let query = query_or_reject(query)?;

    match query.selector() {
        Some(OrderSelector::All) => {
            state.authorize(&headers)?;
            let items = state.orders.list_all().await?;
            instance_debug!(count = items.len(), "Listed all orders");
            Ok(Json(OrderListing::new(items)).into_response())
        }
        Some(OrderSelector::ById(order_id)) => {
            let found: Vec<_> = state.orders.get(&order_id).await?.into_iter().collect();
            instance_debug!(order_id = %order_id, found = found.len(), "Order lookup");
            Ok(Json(found).into_response())
        }
        Some(OrderSelector::ByPhone(phone)) => {
            let items = state.orders.find_by_phone(&phone).await?;
            instance_debug!(found = items.len(), "Phone lookup");
            Ok(Json(items).into_response())
        }
        None => Err(ApiError::validation("need orderId or phone or list=true")),
    }
}

/// POST / PUT - create or merge an order
pub async fn upsert_order<K, C>(
    State(state): State<Arc<ApiState<K, C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UpsertReply>>
where
    K: KvStore + 'static,
    C: Clock + 'static,
{
    state.authorize(&headers)?;
    let patch = parse_object_body(&body)?;
    let requested = patch.get(ORDER_ID_FIELD).and_then(OrderId::from_value);

    let outcome = state.orders.upsert(requested, patch).await?;
    Ok(Json(UpsertReply {
        ok: true,
        order_id: outcome.id.to_string(),
        order: outcome.record,
    }))
}

/// DELETE - remove an order named by `?orderId=` or the body's `orderId`
pub async fn delete_order<K, C>(
    State(state): State<Arc<ApiState<K, C>>>,
    headers: HeaderMap,
    query: Result<Query<OrderQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Json<DeleteReply>>
where
    K: KvStore + 'static,
    C: Clock + 'static,
{
    state.authorize(&headers)?;
    let query = query_or_reject(query)?;

    let from_query = query.order_id.as_deref().and_then(OrderId::parse);
    let order_id = match from_query {
        Some(id) => id,
        None => parse_object_body(&body)?
            .get(ORDER_ID_FIELD)
            .and_then(OrderId::from_value)
            .ok_or_else(|| ApiError::validation("orderId required"))?,
    };

    state.orders.delete(&order_id).await?;
    Ok(Json(DeleteReply {
        ok: true,
        deleted: order_id.to_string(),
    }))
}

/// Any other verb on the orders route
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
