//! Data-access layer.
//!
//! Translates list/create/remove for one resource into calls against the
//! injected [`BackingStore`](crate::db::BackingStore) and returns either the
//! payload or a [`DataError`] whose message is what the user sees.

pub mod access;
pub mod dashboard;

pub use access::DataAccess;

use serde::Serialize;
use thiserror::Error;

use crate::db::{Resource, StoreError};

#[derive(Debug, Error)]
pub enum DataError {
    /// Transport or backend failure, message passed through.
    #[error("{0}")]
    Store(StoreError),

    #[error("Item not found")]
    NotFound { resource: Resource, id: i64 },

    #[error("Endpoint not supported: {0}")]
    Unsupported(String),

    #[error("Missing required field(s): {0}")]
    Validation(String),

    /// A field has the wrong type or an unknown enum value.
    #[error("Invalid {resource} record: {reason}")]
    Invalid { resource: Resource, reason: String },

    #[error("Failed to decode {resource} row: {reason}")]
    Decode { resource: Resource, reason: String },

    #[error("Backend task failed: {0}")]
    Backend(String),
}

impl From<StoreError> for DataError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownResource(name) => DataError::Unsupported(name),
            other => DataError::Store(other),
        }
    }
}

/// Uniform result envelope: `{data}`, `{data, message}`, `{message}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Data {
        data: T,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Message { message: String },
    Error { error: String },
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        ApiResponse::Data { data, message: None }
    }

    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse::Message { message: message.into() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ApiResponse::Error { error: error.into() }
    }
}

pub fn added_message(resource: Resource) -> String {
    format!("{} added successfully", resource.label())
}

pub fn deleted_message(resource: Resource) -> String {
    format!("{} deleted successfully", resource.label())
}
