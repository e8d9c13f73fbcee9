//! Test helper utilities for order API integration tests

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use order_api::{ApiState, InMemoryKvStore, KvStore, OrderStore, OrderStoreConfig, build_router};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use super::fixtures::{ADMIN_TOKEN, FixedClock};

/// Router over `store` with a fixed clock
pub fn router_with<K: KvStore + 'static>(store: Arc<K>, probe_enabled: bool) -> Router {
    let orders = OrderStore::new(store, Arc::new(FixedClock::default()), OrderStoreConfig::default());
    build_router(Arc::new(ApiState::new(orders, ADMIN_TOKEN, probe_enabled)))
}

/// Router over a fresh in-memory store, returning the store for inspection
pub fn memory_router() -> (Router, Arc<InMemoryKvStore>) {
    let store = Arc::new(InMemoryKvStore::new());
    (router_with(store.clone(), false), store)
}

/// Fire one request and decode the JSON reply
pub async fn send(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder.body(Body::from(body.unwrap_or("").to_string())).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

pub async fn admin(router: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    send(router, method, uri, Some(ADMIN_TOKEN), body).await
}

pub async fn public_get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None, None).await
}

/// Order IDs in a JSON array of records, sorted
pub fn order_ids(items: &Value) -> Vec<String> {
    let mut ids: Vec<String> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["orderId"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}
