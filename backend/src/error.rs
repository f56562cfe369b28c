//! Application error handling
//!
//! Two layers live here:
//! - [`BlogError`]: the closed error taxonomy returned by the credential,
//!   session and storage core. One variant per failure kind.
//! - [`ApiError`]: the HTTP boundary type. Every `BlogError` is mapped to a
//!   response category by an exhaustive `match` in `From<BlogError>`.

use crate::auth::{GuardRejection, HashingError, TokenError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blog_shared::types::{ErrorDetail, ErrorResponse};
use thiserror::Error;
use tracing::{debug, error};

/// Core error taxonomy
#[derive(Error, Debug)]
pub enum BlogError {
    /// Wrong user name or wrong password. The two are never distinguished.
    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("user \"{0}\" already exists")]
    DuplicateIdentity(String),

    #[error("post with URL handle \"{0}\" already exists")]
    DuplicateItem(String),

    #[error("user \"{0}\" not found")]
    IdentityNotFound(String),

    #[error("post with URL handle \"{0}\" not found")]
    ItemNotFound(String),

    #[error("page {page} with size {page_size} is out of range")]
    InvalidPage { page: i64, page_size: i64 },

    #[error(transparent)]
    Hashing(#[from] HashingError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Result type alias for the core
pub type BlogResult<T> = Result<T, BlogError>;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<BlogError> for ApiError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            BlogError::DuplicateIdentity(_) | BlogError::DuplicateItem(_) => {
                ApiError::Conflict(err.to_string())
            }
            BlogError::IdentityNotFound(_) | BlogError::ItemNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            BlogError::InvalidPage { .. } => ApiError::BadRequest(err.to_string()),
            BlogError::Hashing(HashingError::InputTooLong { .. }) => {
                ApiError::BadRequest(err.to_string())
            }
            BlogError::Hashing(inner) => ApiError::Internal(anyhow::Error::new(inner)),
            BlogError::Token(inner @ TokenError::Issue(_)) => {
                ApiError::Internal(anyhow::Error::new(inner))
            }
            BlogError::Token(reason) => {
                debug!(%reason, "session token rejected");
                ApiError::Unauthorized("auth token expired or invalid".to_string())
            }
            BlogError::Storage(inner) => ApiError::Database(inner),
        }
    }
}

impl From<GuardRejection> for ApiError {
    fn from(rejection: GuardRejection) -> Self {
        ApiError::Unauthorized(rejection.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field: None,
                details: None,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
