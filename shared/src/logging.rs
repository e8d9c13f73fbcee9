//! Shared logging utilities for consistent tracing across the service

use crate::types::InstanceId;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Build the filter directive for the service crates at `base_level`
pub fn filter_directive(base_level: &str) -> String {
    format!("order_api={base_level},shared={base_level},tower_http={base_level},axum={base_level},reqwest=warn,hyper=warn")
}

/// Initialize the stdout tracing subscriber
///
/// `RUST_LOG` wins over `log_level` when it is set.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let base_level = log_level.unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(base_level)));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for instance-aware info logging
#[macro_export]
macro_rules! instance_info {
    ($($arg:tt)*) => {
        tracing::info!(
            instance = %$crate::types::InstanceId::current(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for instance-aware warning logging
#[macro_export]
macro_rules! instance_warn {
    ($($arg:tt)*) => {
        tracing::warn!(
            instance = %$crate::types::InstanceId::current(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for instance-aware error logging
#[macro_export]
macro_rules! instance_error {
    ($($arg:tt)*) => {
        tracing::error!(
            instance = %$crate::types::InstanceId::current(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for instance-aware debug logging
#[macro_export]
macro_rules! instance_debug {
    ($($arg:tt)*) => {
        tracing::debug!(
            instance = %$crate::types::InstanceId::current(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(
        instance = %InstanceId::current(),
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(reason: &str) {
    info!(
        instance = %InstanceId::current(),
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        instance = %InstanceId::current(),
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!(
        instance = %InstanceId::current(),
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_covers_service_crates() {
        let directive = filter_directive("debug");
        assert!(directive.contains("order_api=debug"));
        assert!(directive.contains("shared=debug"));
        assert!(directive.contains("reqwest=warn"));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = format_timestamp();
        // HH:MM:SS.mmm
        assert_eq!(ts.len(), 12);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[8..9], ".");
    }
}
