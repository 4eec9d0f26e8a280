use std::collections::HashMap;
use thiserror::Error;

/// Failures of catalog operations, independent of any HTTP status.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Invalid identifier for {field}: {value}")]
    InvalidIdentifier { field: String, value: String },

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("{message}")]
    ValidationFailed {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0} name already exists")]
    DuplicateName(&'static str),

    #[error("{0}")]
    ForeignKeyInvalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CatalogError {
    pub fn invalid_identifier(field: impl Into<String>, value: impl Into<String>) -> Self {
        CatalogError::InvalidIdentifier {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_pagination(message: impl Into<String>) -> Self {
        CatalogError::InvalidPagination(message.into())
    }

    pub fn validation_failed(field_errors: HashMap<String, String>) -> Self {
        CatalogError::ValidationFailed {
            message: "Validation failed".to_string(),
            field_errors,
        }
    }
}
