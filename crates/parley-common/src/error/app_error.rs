//! Application error types
//!
//! Errors raised outside a live connection: the HTTP upgrade handshake and
//! process startup.

use parley_core::{DomainError, ErrorKind};
use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authentication")]
    MissingAuth,

    #[error("Unknown identity")]
    UnknownIdentity,

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken | Self::TokenExpired | Self::MissingAuth | Self::UnknownIdentity => {
                401
            }

            Self::Database(_) | Self::Cache(_) | Self::Config(_) | Self::Internal(_) => 500,

            Self::Domain(e) => match e.kind() {
                ErrorKind::Validation => 400,
                ErrorKind::AccessDenied => 403,
                ErrorKind::NotFound => 404,
                ErrorKind::Stale => 409,
                ErrorKind::RateLimited => 429,
                ErrorKind::Internal => 500,
            },
        }
    }

    /// Get error code for responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingAuth => "MISSING_AUTH",
            Self::UnknownIdentity => "UNKNOWN_IDENTITY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code())
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(msg: impl fmt::Display) -> Self {
        Self::Config(msg.to_string())
    }
}

/// Error body for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let message = if err.is_server_error() {
            "Something went wrong".to_string()
        } else {
            err.to_string()
        };
        Self {
            code: err.error_code().to_string(),
            message,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::RoomId;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidToken.status_code(), 401);
        assert_eq!(AppError::MissingAuth.status_code(), 401);
        assert_eq!(AppError::Database("test".to_string()).status_code(), 500);
        assert_eq!(
            AppError::from(DomainError::RoomNotFound(RoomId::new())).status_code(),
            404
        );
        assert_eq!(
            AppError::from(DomainError::RateLimited { retry_after_secs: 1 }).status_code(),
            429
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::TokenExpired.error_code(), "TOKEN_EXPIRED");
        assert_eq!(
            AppError::from(DomainError::NotMessageSender).error_code(),
            "NOT_MESSAGE_SENDER"
        );
    }

    #[test]
    fn test_server_errors() {
        assert!(!AppError::InvalidToken.is_server_error());
        assert!(AppError::Cache("test".to_string()).is_server_error());
    }

    #[test]
    fn test_error_response_hides_internals() {
        let response = ErrorResponse::from(AppError::Database("password=hunter2".to_string()));
        assert_eq!(response.code, "DATABASE_ERROR");
        assert_eq!(response.message, "Something went wrong");

        let response = ErrorResponse::from(AppError::InvalidToken);
        assert_eq!(response.message, "Invalid token");
    }
}
