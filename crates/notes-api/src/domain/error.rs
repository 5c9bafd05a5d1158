//! Error types for the notes API.
//!
//! Service-level errors (`AuthError`, `NoteError`) are typed and carry no HTTP
//! knowledge. `ApiError` is the client-visible shape; the mapping between them
//! lives in `adapters::error_conversions`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use notes_crypto::CryptoError;
use std::fmt;

use super::config::ConfigError;

/// Stable machine-readable error codes
pub mod codes {
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const UNAUTHENTICATED: &str = "unauthenticated";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const CONFLICT: &str = "conflict";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Client-visible error with HTTP status
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Machine-readable code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Malformed or invalid request input
    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_REQUEST, details)
    }

    /// Missing or invalid authentication
    pub fn unauthenticated(details: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHENTICATED, details)
    }

    /// Authenticated principal lacks a permission
    pub fn forbidden(details: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, codes::FORBIDDEN, details)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            format!("{} not found", resource.into()),
        )
    }

    /// Resource already exists
    pub fn conflict(details: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, codes::CONFLICT, details)
    }

    /// Internal error. Detail stays in the server log.
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            "internal server error",
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });

        let mut response = (self.status, Json(body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Persistence collaborator errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violated
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    /// Backend failure
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Signup / login errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Username (or email) already registered
    #[error("identity already exists")]
    IdentityTaken,
    /// Unknown username or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Credentials verified but the identity record vanished
    #[error("identity record missing after successful verification")]
    IdentityMissing,
    /// Rejected input
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Token could not be issued
    #[error("token error: {0}")]
    Token(#[from] CryptoError),
    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Password hashing failure
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Note management errors
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// No such note for this owner
    #[error("note not found")]
    NotFound,
    /// Rejected input
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The authenticated subject has no identity record
    #[error("identity record missing for authenticated subject")]
    IdentityMissing,
    /// Content encryption or decryption failed
    #[error("content crypto error: {0}")]
    Crypto(#[from] CryptoError),
    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Server-level errors (startup and serving)
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration rejected; the process must not start
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Listener could not bind
    #[error("server bind error: {0}")]
    Bind(String),
    /// I/O while serving
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CryptoError> for ServerError {
    fn from(e: CryptoError) -> Self {
        ServerError::Config(ConfigError::Crypto(e))
    }
}
