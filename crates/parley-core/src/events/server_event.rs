//! Outbound events - everything the server pushes to a connection
//!
//! Frames are JSON objects of the form `{"event": "<name>", "data": {...}}`
//! with camelCase payload fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Message, MessageStatus, MessageType, Reaction, User};
use crate::value_objects::{MessageId, RoomId, UserId};

/// All events a connection can receive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    // =========================================================================
    // Session
    // =========================================================================
    /// Handshake accepted; lists the rooms the connection was subscribed to
    #[serde(rename_all = "camelCase")]
    Connected { user_id: UserId, rooms: Vec<RoomId> },

    // =========================================================================
    // Rooms
    // =========================================================================
    /// Recent history, oldest first, sent only to the joining connection
    #[serde(rename_all = "camelCase")]
    RoomMessages {
        room_id: RoomId,
        messages: Vec<MessageView>,
    },

    // =========================================================================
    // Messages
    // =========================================================================
    NewMessage { message: MessageView },

    /// Sent for both edits and soft deletes
    MessageUpdated { message: MessageView },

    #[serde(rename_all = "camelCase")]
    ReactionUpdated {
        message_id: MessageId,
        reactions: Vec<Reaction>,
    },

    // =========================================================================
    // Presence
    // =========================================================================
    #[serde(rename_all = "camelCase")]
    UserTyping {
        room_id: RoomId,
        user_id: UserId,
        user_name: String,
        is_typing: bool,
    },

    #[serde(rename_all = "camelCase")]
    UserOnline { user_id: UserId, user: UserSummary },

    #[serde(rename_all = "camelCase")]
    UserOffline { user_id: UserId, user: UserSummary },

    // =========================================================================
    // Errors
    // =========================================================================
    #[serde(rename_all = "camelCase")]
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_after: Option<u64>,
    },
}

impl ServerEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::RoomMessages { .. } => "room_messages",
            Self::NewMessage { .. } => "new_message",
            Self::MessageUpdated { .. } => "message_updated",
            Self::ReactionUpdated { .. } => "reaction_updated",
            Self::UserTyping { .. } => "user_typing",
            Self::UserOnline { .. } => "user_online",
            Self::UserOffline { .. } => "user_offline",
            Self::Error { .. } => "error",
        }
    }

    /// Build an error event
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
            retry_after: None,
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
            is_online: user.is_online,
            last_seen: user.last_seen,
        }
    }
}

/// The message a reply points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    pub id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: MessageType,
}

impl From<&Message> for ReplyPreview {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            message_type: message.message_type,
        }
    }
}

/// A message as clients see it, with sender and reply target resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender: UserSummary,
    pub content: String,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyPreview>,
    pub reactions: Vec<Reaction>,
    pub status: MessageStatus,
    pub edited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(message: &Message, sender: UserSummary, reply_to: Option<ReplyPreview>) -> Self {
        Self {
            id: message.id,
            room_id: message.room_id,
            sender,
            content: message.content.clone(),
            message_type: message.message_type,
            reply_to,
            reactions: message.reactions.clone(),
            status: message.status,
            edited: message.is_edited(),
            edited_at: message.edited_at,
            created_at: message.created_at,
        }
    }
}
