//! # API Errors
//!
//! Every failure a handler can produce, and how it is rendered:
//! `{"error": {"message": ..., "status": ...}}` with the matching HTTP status.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::engine::StoreError;
use crate::validate::ValidationError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Request fields failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body was not a JSON object of the expected shape
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    /// Requested interval intersects an existing booking in the room
    #[error("Booking overlaps existing booking")]
    Conflict,

    /// Delete target absent, or no route matched
    #[error("{0}")]
    NotFound(&'static str),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// The store failed to read or write
    #[error("storage failure: {0}")]
    Storage(String),

    /// Anything unclassified
    #[error("internal failure: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client. Server-side details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Storage(_) => "Database error".to_string(),
            ApiError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => ApiError::Conflict,
            StoreError::Wal(detail) => ApiError::Storage(detail),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: ErrorBody {
                message: err.client_message(),
                status: err.status_code().as_u16(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{self}");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
