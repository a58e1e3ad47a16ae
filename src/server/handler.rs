//! Error type shared by the HTTP handlers
//!
//! Handlers report request problems as an [`ApiError`]; its [`ErrorCode`]
//! decides the HTTP status and the message becomes the `error` field of the
//! response body.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error code categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing request fields
    InvalidParams,
    /// Requested level does not exist
    NotFound,
    /// Failure outside the request (store, runtime)
    InternalError,
}

impl ErrorCode {
    /// HTTP status reported for this code
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidParams => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error type for HTTP handlers
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an invalid params error
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
