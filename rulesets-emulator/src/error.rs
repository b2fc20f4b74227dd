//! API error types and error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rulesets_core::{CoreError, Message};
use rulesets_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => ApiError::NotFound(msg),
            StorageError::AlreadyExists(msg) | StorageError::InvalidOperation(msg) => {
                ApiError::BadRequest(msg)
            }
            StorageError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Failure envelope, same shape as successful responses
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    errors: Vec<Message>,
    messages: Vec<Message>,
    result: Option<()>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, 10007),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, 10021),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, 10000),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, 10002),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            errors: vec![Message::new(code, self.to_string())],
            messages: Vec::new(),
            result: None,
        });

        (status, body).into_response()
    }
}
