//! Shared request state
//!
//! Everything a handler needs: the order store and the admin secret.

use axum::http::HeaderMap;
use shared::instance_warn;
use std::time::Instant;

use crate::core::OrderStore;
use crate::error::{ApiError, ApiResult};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// State handed to every handler
pub struct ApiState<K, C> {
    pub orders: OrderStore<K, C>,
    admin_token: String,
    probe_enabled: bool,
    started_at: Instant,
}

impl<K, C> ApiState<K, C> {
    pub fn new(orders: OrderStore<K, C>, admin_token: impl Into<String>, probe_enabled: bool) -> Self {
        Self {
            orders,
            admin_token: admin_token.into(),
            probe_enabled,
            started_at: Instant::now(),
        }
    }

    /// Require `X-Admin-Token` to equal the configured secret
    pub fn authorize(&self, headers: &HeaderMap) -> ApiResult<()> {
        let presented = headers.get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok());
        if presented == Some(self.admin_token.as_str()) {
            Ok(())
        } else {
            instance_warn!(token_present = presented.is_some(), "🔒 Rejected admin request");
            Err(ApiError::Unauthorized)
        }
    }

    pub fn probe_enabled(&self) -> bool {
        self.probe_enabled
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OrderStoreConfig;
    use crate::services::{InMemoryKvStore, SystemClock};
    use axum::http::{HeaderName, HeaderValue};
    use std::sync::Arc;

    fn state() -> ApiState<InMemoryKvStore, SystemClock> {
        let orders = OrderStore::new(
            Arc::new(InMemoryKvStore::new()),
            Arc::new(SystemClock::utc()),
            OrderStoreConfig::default(),
        );
        ApiState::new(orders, "s3cret", false)
    }

    #[test]
    fn test_authorize_requires_exact_token() {
        let state = state();

        let mut headers = HeaderMap::new();
        assert!(matches!(state.authorize(&headers), Err(ApiError::Unauthorized)));

        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("S3CRET"));
        assert!(state.authorize(&headers).is_err());

        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert!(state.authorize(&headers).is_ok());
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let state = state();
        let mut headers = HeaderMap::new();
        let name: HeaderName = "X-Admin-Token".parse().unwrap();
        headers.insert(name, HeaderValue::from_static("s3cret"));
        assert!(state.authorize(&headers).is_ok());
        assert!(!state.probe_enabled());
    }
}
