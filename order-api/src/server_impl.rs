//! Main server implementation
//!
//! Wires the order handlers into an Axum router around an injected store
//! and clock, and runs it until shutdown.

use axum::{Router, routing::get};
use shared::{instance_info, logging};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;
use crate::traits::{Clock, KvStore};
use crate::web::handlers::{health, orders, probe};

/// Build the Axum router with all routes
pub fn build_router<K, C>(state: Arc<ApiState<K, C>>) -> Router
where
    K: KvStore + 'static,
    C: Clock + 'static,
{
    let order_routes = get(orders::query_orders::<K, C>)
        .post(orders::upsert_order::<K, C>)
        .put(orders::upsert_order::<K, C>)
        .delete(orders::delete_order::<K, C>)
        .fallback(orders::method_not_allowed);

    let mut router = Router::new()
        .route("/orders", order_routes.clone())
        // Path the serverless deployment exposed
        .route("/api/orders", order_routes)
        .route("/health", get(health::health_check::<K, C>));

    if state.probe_enabled() {
        router = router.route("/api/kv-test", get(probe::kv_probe::<K, C>));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

/// Order API server with dependency injection
pub struct OrderServer<K, C> {
    bind_address: SocketAddr,
    state: Arc<ApiState<K, C>>,
}

impl<K, C> OrderServer<K, C>
where
    K: KvStore + 'static,
    C: Clock + 'static,
{
    pub fn new(bind_address: SocketAddr, state: ApiState<K, C>) -> Self {
        Self {
            bind_address,
            state: Arc::new(state),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.bind_address)
            .await
            .map_err(|e| ApiError::ServerStartup(format!("Failed to bind to {}: {}", self.bind_address, e)))?;

        instance_info!("🌐 Order API listening on http://{}", self.bind_address);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Resolves on Ctrl+C
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logging::log_shutdown("Received Ctrl+C signal"),
        Err(err) => {
            logging::log_error("Signal handling", &err);
            // Without a signal handler, never trigger shutdown
            std::future::pending::<()>().await;
        }
    }
}
