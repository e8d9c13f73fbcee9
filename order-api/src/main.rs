//! Order API entry point

use clap::Parser;
use shared::{InstanceId, instance_info, instance_warn, logging};
use std::sync::Arc;

use order_api::{
    ApiResult, ApiState, InMemoryKvStore, KvStore, OrderServer, OrderStore, RestKvStore, ServerArgs, Settings,
    StoreBackend, SystemClock, shutdown_signal,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Missing .env is fine; real environment variables still apply
    let _ = dotenv::dotenv();
    let args = ServerArgs::parse();

    InstanceId::init("order-api");
    logging::init_tracing(Some(args.log_level.as_str()));

    let settings = args.into_settings()?;
    logging::log_startup(&format!("order API on {}", settings.bind_address));

    let clock = Arc::new(if settings.utc { SystemClock::utc() } else { SystemClock::local() });

    match &settings.backend {
        StoreBackend::Memory => {
            instance_warn!("⚠️ Using in-memory store; orders are lost on exit");
            serve(Arc::new(InMemoryKvStore::new()), clock, &settings).await?;
        }
        StoreBackend::Rest { url, token } => {
            let store = RestKvStore::new(url, token, settings.kv_timeout)?;
            instance_info!("🔗 Using key-value store at {}", store.base_url());
            serve(Arc::new(store), clock, &settings).await?;
        }
    }

    logging::log_success("Order API stopped gracefully");
    Ok(())
}

async fn serve<K>(store: Arc<K>, clock: Arc<SystemClock>, settings: &Settings) -> ApiResult<()>
where
    K: KvStore + 'static,
{
    let orders = OrderStore::new(store, clock, settings.order_store.clone());
    let state = ApiState::new(orders, settings.admin_token.clone(), settings.probe_enabled);
    OrderServer::new(settings.bind_address, state).run(shutdown_signal()).await
}
