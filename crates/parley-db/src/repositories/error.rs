//! Error handling utilities for repositories

use parley_core::error::DomainError;
use parley_core::value_objects::{MessageId, RoomId, UserId};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Map a foreign key violation to a not-found error, anything else to a database error
pub fn map_fk_violation<F>(e: SqlxError, on_missing: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return on_missing();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "user not found" error
pub fn user_not_found(id: UserId) -> DomainError {
    DomainError::UserNotFound(id)
}

/// Create a "room not found" error
pub fn room_not_found(id: RoomId) -> DomainError {
    DomainError::RoomNotFound(id)
}

/// Create a "message not found" error
pub fn message_not_found(id: MessageId) -> DomainError {
    DomainError::MessageNotFound(id)
}
