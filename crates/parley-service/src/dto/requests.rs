//! Request DTOs for inbound gateway events
//!
//! Field names follow the wire protocol (camelCase). Decoding failures are
//! reported by the gateway; rules that depend on configuration are checked
//! by the services.

use parley_core::{MessageId, RoomId};
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Room Requests
// ============================================================================

/// Subscribe to a room and receive its recent history
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: RoomId,
}

/// Unsubscribe from a room channel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    pub room_id: RoomId,
}

/// Typing indicator
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub room_id: RoomId,
    pub is_typing: bool,
}

// ============================================================================
// Message Requests
// ============================================================================

/// Send a message to a room
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub room_id: RoomId,
    pub content: String,

    /// Type tag, `text` when absent
    #[serde(default)]
    pub message_type: Option<String>,

    /// Message being replied to
    #[serde(default)]
    pub reply_to: Option<MessageId>,
}

/// Replace the content of one's own message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageRequest {
    pub message_id: MessageId,
    pub content: String,
}

/// Soft-delete one's own message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageRequest {
    pub message_id: MessageId,
}

// ============================================================================
// Reaction Requests
// ============================================================================

/// Set the caller's reaction, replacing any previous one
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionRequest {
    pub message_id: MessageId,

    #[validate(length(min = 1, max = 32, message = "Emoji must be 1-32 characters"))]
    pub emoji: String,
}

/// Remove the caller's reaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveReactionRequest {
    pub message_id: MessageId,
}
