//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{MessageId, RoomId, UserId};

/// Coarse failure class every domain error maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    AccessDenied,
    RateLimited,
    NotFound,
    Stale,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::AccessDenied => "access_denied",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::Stale => "stale",
            Self::Internal => "internal",
        }
    }
}

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Message type not allowed: {0}")]
    InvalidMessageType(String),

    #[error("Reply target not found in this room: {0}")]
    InvalidReplyTarget(MessageId),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not a member of room {0}")]
    NotRoomMember(RoomId),

    #[error("Not subscribed to room {0}")]
    NotSubscribed(RoomId),

    #[error("Not message sender")]
    NotMessageSender,

    // =========================================================================
    // Throttling
    // =========================================================================
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    // =========================================================================
    // Stale State
    // =========================================================================
    #[error("Message has been deleted")]
    MessageDeleted,

    #[error("Edit window has expired")]
    EditWindowExpired,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Failure class for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_)
            | Self::EmptyContent
            | Self::ContentTooLong { .. }
            | Self::InvalidMessageType(_)
            | Self::InvalidReplyTarget(_) => ErrorKind::Validation,

            Self::NotRoomMember(_) | Self::NotSubscribed(_) | Self::NotMessageSender => {
                ErrorKind::AccessDenied
            }

            Self::RateLimited { .. } => ErrorKind::RateLimited,

            Self::UserNotFound(_) | Self::RoomNotFound(_) | Self::MessageNotFound(_) => {
                ErrorKind::NotFound
            }

            Self::MessageDeleted | Self::EditWindowExpired => ErrorKind::Stale,

            Self::DatabaseError(_) | Self::CacheError(_) | Self::InternalError(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Get an error code string for client error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidMessageType(_) => "INVALID_MESSAGE_TYPE",
            Self::InvalidReplyTarget(_) => "INVALID_REPLY_TARGET",

            Self::NotRoomMember(_) => "NOT_ROOM_MEMBER",
            Self::NotSubscribed(_) => "NOT_SUBSCRIBED",
            Self::NotMessageSender => "NOT_MESSAGE_SENDER",

            Self::RateLimited { .. } => "RATE_LIMITED",

            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::RoomNotFound(_) => "UNKNOWN_ROOM",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",

            Self::MessageDeleted => "MESSAGE_DELETED",
            Self::EditWindowExpired => "EDIT_WINDOW_EXPIRED",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Seconds to wait before retrying, for rate-limit rejections
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        self.kind() == ErrorKind::AccessDenied
    }

    /// Check if this is an infrastructure failure
    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}
