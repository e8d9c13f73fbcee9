//! Liveness endpoint

use axum::{extract::State, response::Json};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::ApiState;

/// Health check endpoint - /health
pub async fn health_check<K, C>(State(state): State<Arc<ApiState<K, C>>>) -> Json<Value>
where
    K: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
        "uptime": state.uptime_seconds(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
