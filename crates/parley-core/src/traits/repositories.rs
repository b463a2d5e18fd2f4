//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (PostgreSQL or in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{MemberRole, Message, Reaction, Room, User};
use crate::error::DomainError;
use crate::value_objects::{ConnectionId, MessageId, RoomId, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    /// Persist online state and the most recent connection id
    async fn mark_online(
        &self,
        id: UserId,
        connection_id: ConnectionId,
        at: DateTime<Utc>,
    ) -> RepoResult<()>;

    /// Persist offline state, clearing the connection id
    async fn mark_offline(&self, id: UserId, last_seen: DateTime<Utc>) -> RepoResult<()>;
}

// ============================================================================
// Room Repository
// ============================================================================

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find room by ID, members included
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>>;

    /// List all rooms a user is a member of
    async fn find_by_member(&self, user_id: UserId) -> RepoResult<Vec<Room>>;

    /// Check membership without loading the room
    async fn is_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<bool>;

    /// Create a room with its initial members
    async fn create(&self, room: &Room) -> RepoResult<()>;

    /// Add a member (no-op if already present)
    async fn add_member(
        &self,
        room_id: RoomId,
        user_id: UserId,
        role: MemberRole,
    ) -> RepoResult<()>;

    /// Remove a member (no-op if absent)
    async fn remove_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<()>;

    /// Point the room at its newest message
    async fn set_last_message(&self, room_id: RoomId, message_id: MessageId) -> RepoResult<()>;
}

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID, reactions included
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>>;

    /// Most recent messages of a room, newest first
    async fn find_recent(&self, room_id: RoomId, limit: i64) -> RepoResult<Vec<Message>>;

    /// Create a new message
    async fn create(&self, message: &Message) -> RepoResult<()>;

    /// Persist content, type, status and edit metadata
    async fn update(&self, message: &Message) -> RepoResult<()>;

    /// Set the user's reaction (replacing theirs) and return the full list
    async fn set_reaction(
        &self,
        message_id: MessageId,
        reaction: &Reaction,
    ) -> RepoResult<Vec<Reaction>>;

    /// Remove the user's reaction if any and return the full list
    async fn remove_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
    ) -> RepoResult<Vec<Reaction>>;
}
