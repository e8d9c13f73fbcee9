//! Command line / environment configuration
//!
//! Every flag falls back to an environment variable, and `.env` is loaded
//! before parsing, so the same binary runs from a shell or a container.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::core::{KeySchema, OrderStoreConfig};
use crate::error::{ApiError, ApiResult};

/// Order API server
#[derive(Parser, Debug, Clone)]
#[command(name = "order-api")]
#[command(about = "HTTP API for order records kept in a hosted key-value store")]
pub struct ServerArgs {
    /// Interface to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for HTTP server
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Shared secret expected in the X-Admin-Token header
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// REST endpoint of the key-value store
    #[arg(long, env = "KV_REST_API_URL")]
    pub kv_url: Option<String>,

    /// Bearer token for the key-value store
    #[arg(long, env = "KV_REST_API_TOKEN", hide_env_values = true)]
    pub kv_token: Option<String>,

    /// Keep data in process memory instead of the hosted store
    #[arg(long)]
    pub memory_store: bool,

    /// Per-request timeout for the key-value store, in milliseconds
    #[arg(long, env = "KV_TIMEOUT_MS", default_value = "5000")]
    pub kv_timeout_ms: u64,

    /// How often a write is re-run after a concurrent change
    #[arg(long, env = "MAX_WRITE_ATTEMPTS", default_value = "5")]
    pub max_write_attempts: u32,

    /// Prefix of generated order IDs
    #[arg(long, env = "ORDER_ID_PREFIX", default_value = "ORD")]
    pub id_prefix: String,

    /// Stamp times in UTC instead of server-local time
    #[arg(long)]
    pub utc: bool,

    /// Mount the /api/kv-test diagnostic route
    #[arg(long)]
    pub enable_kv_probe: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Where order data lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Rest { url: String, token: String },
}

/// Validated runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: SocketAddr,
    pub admin_token: String,
    pub backend: StoreBackend,
    pub kv_timeout: Duration,
    pub order_store: OrderStoreConfig,
    pub utc: bool,
    pub probe_enabled: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ServerArgs {
    pub fn into_settings(self) -> ApiResult<Settings> {
        let bind_address: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ApiError::config(format!("Invalid bind address {}:{}: {}", self.host, self.port, e)))?;

        let admin_token = non_empty(self.admin_token)
            .ok_or_else(|| ApiError::config("ADMIN_TOKEN must be set to a non-empty value"))?;

        let backend = if self.memory_store {
            StoreBackend::Memory
        } else {
            match (non_empty(self.kv_url), non_empty(self.kv_token)) {
                (Some(url), Some(token)) => StoreBackend::Rest { url, token },
                _ => {
                    return Err(ApiError::config(
                        "KV_REST_API_URL and KV_REST_API_TOKEN are required unless --memory-store is used",
                    ));
                }
            }
        };

        if self.max_write_attempts == 0 {
            return Err(ApiError::config("--max-write-attempts must be at least 1"));
        }
        if self.id_prefix.chars().any(char::is_whitespace) {
            return Err(ApiError::config("--id-prefix must not contain whitespace"));
        }

        Ok(Settings {
            bind_address,
            admin_token,
            backend,
            kv_timeout: Duration::from_millis(self.kv_timeout_ms),
            order_store: OrderStoreConfig {
                keys: KeySchema::default(),
                id_prefix: self.id_prefix,
                max_write_attempts: self.max_write_attempts,
            },
            utc: self.utc,
            probe_enabled: self.enable_kv_probe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> ServerArgs {
        let mut argv = vec!["order-api", "--admin-token", "t0k", "--host", "127.0.0.1", "--port", "8080"];
        argv.extend_from_slice(extra);
        ServerArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_memory_backend() {
        let settings = parse(&["--memory-store"]).into_settings().unwrap();
        assert_eq!(settings.backend, StoreBackend::Memory);
        assert_eq!(settings.bind_address, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.admin_token, "t0k");
        assert_eq!(settings.order_store.id_prefix, "ORD");
        assert!(!settings.probe_enabled);
    }

    #[test]
    fn test_rest_backend_needs_url_and_token() {
        let settings = parse(&["--kv-url", "https://kv.example.com/", "--kv-token", "abc"])
            .into_settings()
            .unwrap();
        assert_eq!(
            settings.backend,
            StoreBackend::Rest { url: "https://kv.example.com/".into(), token: "abc".into() }
        );

        let mut args = parse(&[]);
        args.kv_url = Some("https://kv.example.com".into());
        args.kv_token = None;
        assert!(matches!(args.into_settings(), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_blank_admin_token_is_rejected() {
        let mut args = parse(&["--memory-store"]);
        args.admin_token = Some("   ".into());
        assert!(matches!(args.into_settings(), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_write_attempts_must_be_positive() {
        assert!(parse(&["--memory-store", "--max-write-attempts", "0"]).into_settings().is_err());
        let settings = parse(&["--memory-store", "--max-write-attempts", "2", "--utc", "--enable-kv-probe"])
            .into_settings()
            .unwrap();
        assert_eq!(settings.order_store.max_write_attempts, 2);
        assert!(settings.utc);
        assert!(settings.probe_enabled);
    }
}
