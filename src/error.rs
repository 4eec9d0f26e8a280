// HTTP API Error Types
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::catalog::CatalogError;

/// HTTP API error with its status code and client-facing message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    InvalidIdentifier(String),
    InvalidPagination(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    DuplicateName(String),

    // 422 Unprocessable Entity
    ValidationFailed {
        message: String,
        field_errors: HashMap<String, String>,
    },
    ForeignKeyInvalid(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 504 Gateway Timeout
    DeadlineExceeded(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidPagination(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateName(_) => StatusCode::CONFLICT,
            ApiError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ForeignKeyInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidIdentifier(msg) => msg,
            ApiError::InvalidPagination(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::DuplicateName(msg) => msg,
            ApiError::ValidationFailed { message, .. } => message,
            ApiError::ForeignKeyInvalid(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::DeadlineExceeded(msg) => msg,
        }
    }

    /// Machine-readable code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            ApiError::InvalidPagination(_) => "INVALID_PAGINATION",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DuplicateName(_) => "DUPLICATE_NAME",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::ForeignKeyInvalid(_) => "FOREIGN_KEY_INVALID",
            ApiError::InternalServerError(_) => "STORAGE_ERROR",
            ApiError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationFailed { field_errors, .. } = self {
            body["field_errors"] = json!(field_errors);
        }

        body
    }
}

impl ApiError {
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        ApiError::InvalidIdentifier(message.into())
    }

    pub fn invalid_pagination(message: impl Into<String>) -> Self {
        ApiError::InvalidPagination(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        ApiError::DeadlineExceeded(message.into())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidIdentifier { .. } => ApiError::invalid_identifier(err.to_string()),
            CatalogError::InvalidPagination(_) => ApiError::invalid_pagination(err.to_string()),
            CatalogError::ValidationFailed {
                message,
                field_errors,
            } => ApiError::ValidationFailed {
                message,
                field_errors,
            },
            CatalogError::DuplicateName(_) => ApiError::DuplicateName(err.to_string()),
            CatalogError::ForeignKeyInvalid(_) => ApiError::ForeignKeyInvalid(err.to_string()),
            CatalogError::NotFound(_) => ApiError::not_found(err.to_string()),
            CatalogError::Unauthorized => ApiError::unauthorized("Unauthorized"),
            CatalogError::DeadlineExceeded(detail) => {
                tracing::warn!("Request deadline exceeded: {}", detail);
                ApiError::deadline_exceeded("The request took too long to complete")
            }
            // Details were logged where the statement failed
            CatalogError::Storage(_) => {
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_identifier(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_pagination(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
