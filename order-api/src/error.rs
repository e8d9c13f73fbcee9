//! Order API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use shared::SharedError;
use thiserror::Error;

/// Failures talking to the key-value store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Key-value store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Key-value store request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Key-value store error: {message}")]
    Remote { message: String },

    #[error("Unexpected reply to {command}: {detail}")]
    UnexpectedReply { command: String, detail: String },

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value: {key}")]
    WrongType { key: String },

    #[error("ERR value is not an integer or out of range: {key}")]
    NotAnInteger { key: String },
}

impl StoreError {
    pub fn unexpected(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            command: command.into(),
            detail: detail.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Shared(#[from] SharedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Order {order_id} kept changing underneath the write; gave up after {attempts} attempts")]
    WriteConflict { order_id: String, attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server startup error: {0}")]
    ServerStartup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            shared::instance_error!(error = %self, "❌ Request failed");
        }
        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
