//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use ironbank_store::StoreError;

/// API error type.
///
/// Every failure the service reports falls into one of these categories;
/// the boundary layer's only job is mapping the tag to a status code and
/// the message to the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request - malformed or invalid input.
    #[error("{0}")]
    BadRequest(String),

    /// Forbidden - authenticated but not entitled, or a business rule
    /// blocked the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected storage or runtime fault.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) => {
                // Log the diagnostic, return a generic message.
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            status: "error",
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::InsufficientFunds { .. } | StoreError::NegativeBalance { .. } => {
                Self::Forbidden("Insufficient balance".into())
            }
            StoreError::DuplicateAccountNumber { .. } => {
                Self::BadRequest("Account number already exists".into())
            }
            StoreError::SameAccountTransfer => {
                Self::BadRequest("Can't transaction with same account".into())
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
