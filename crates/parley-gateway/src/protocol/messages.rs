//! Inbound client events
//!
//! Text frames are JSON objects `{"event": "<name>", "data": {...}}`. The
//! set of events is closed; anything else fails to decode.

use parley_service::dto::{
    AddReactionRequest, DeleteMessageRequest, EditMessageRequest, JoinRoomRequest,
    LeaveRoomRequest, RemoveReactionRequest, SendMessageRequest, TypingRequest,
};
use serde::Deserialize;

/// Every event a client may send
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomRequest),
    LeaveRoom(LeaveRoomRequest),
    SendMessage(SendMessageRequest),
    EditMessage(EditMessageRequest),
    DeleteMessage(DeleteMessageRequest),
    AddReaction(AddReactionRequest),
    RemoveReaction(RemoveReactionRequest),
    Typing(TypingRequest),
}

impl ClientEvent {
    /// Decode a text frame
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Event name as it appears on the wire
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join_room",
            Self::LeaveRoom(_) => "leave_room",
            Self::SendMessage(_) => "send_message",
            Self::EditMessage(_) => "edit_message",
            Self::DeleteMessage(_) => "delete_message",
            Self::AddReaction(_) => "add_reaction",
            Self::RemoveReaction(_) => "remove_reaction",
            Self::Typing(_) => "typing",
        }
    }
}
