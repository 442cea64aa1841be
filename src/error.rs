use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::repository::RepositoryError;

/// ApiError
///
/// Every failure a handler or the auth extractor can produce. Each variant maps to
/// exactly one HTTP status; no failure is retried, every error is terminal for the request.
///
/// `MissingToken` is 403 while `InvalidToken` is 401.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A user, category, article or token subject does not exist.
    #[error("{0}")]
    NotFound(String),

    /// No bearer credential on a protected route.
    #[error("No token provided")]
    MissingToken,

    /// Bearer credential present but malformed, expired or wrongly signed.
    #[error("Unauthorized")]
    InvalidToken,

    /// Role or ownership gate rejected the caller.
    #[error("{0}")]
    Forbidden(String),

    /// Login with an unknown username or a wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// Storage failures are reported with their raw message.
    #[error("{0}")]
    Repository(RepositoryError),

    #[error("{0}")]
    Internal(String),
}

/// ErrorResponse
///
/// JSON body returned for every `ApiError`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// The HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::MissingToken => (StatusCode::FORBIDDEN, "MISSING_TOKEN"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Repository(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

// Unique-key collisions surface as 409.
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(message) => ApiError::Conflict(message),
            other => ApiError::Repository(other),
        }
    }
}

// --- Extractor rejections ---
// Malformed bodies, query strings and path segments get the same JSON error body.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for handlers and the auth layer.
pub type ApiResult<T> = Result<T, ApiError>;
