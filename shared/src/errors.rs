//! Shared error types for the order service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Stored record {key} is not valid JSON: {message}")]
    MalformedRecord { key: String, message: String },

    #[error("Stored record {key} is not a JSON object")]
    NotAnObject { key: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
