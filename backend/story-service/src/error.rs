/// Error types for Story Service
///
/// This module defines all error types that can occur in the story-service.
/// Errors are converted to appropriate HTTP responses for API clients.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;

/// Result type for story-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Story missing, or expired at read time
    NotFound(String),

    /// Actor is not allowed to perform the operation
    PermissionDenied(String),

    /// Media upload to the media store failed; no record was written
    Upload(String),

    /// Media deletion at the media store failed
    MediaDelete(String),

    /// Metadata write failed after a successful media upload
    Write(String),

    /// Transient backend failure, retryable
    Unavailable(String),

    /// Malformed or rejected request input
    BadRequest(String),

    /// Internal server error
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            AppError::Upload(msg) => write!(f, "Media upload failed: {}", msg),
            AppError::MediaDelete(msg) => write!(f, "Media delete failed: {}", msg),
            AppError::Write(msg) => write!(f, "Metadata write failed: {}", msg),
            AppError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Upload(_) | AppError::MediaDelete(_) => StatusCode::BAD_GATEWAY,
            AppError::Write(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
