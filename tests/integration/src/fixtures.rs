//! Test fixtures and frame builders
//!
//! Provides seeded users and rooms plus the inbound frames tests send.

use parley_core::{MemberRole, MessageId, Room, RoomId, User, UserId};
use parley_db::MemoryStores;
use serde_json::{json, Value};

/// Three users and one room.
///
/// `alice` and `bob` belong to `general`; `carol` belongs to nothing.
#[derive(Debug, Clone)]
pub struct Seed {
    pub alice: User,
    pub bob: User,
    pub carol: User,
    pub general: RoomId,
}

impl Seed {
    pub fn new() -> Self {
        Self {
            alice: User::new(UserId::new(), "alice"),
            bob: User::new(UserId::new(), "bob"),
            carol: User::new(UserId::new(), "carol"),
            general: RoomId::new(),
        }
    }

    /// Load the seed into fresh in-memory stores
    pub fn stores(&self) -> MemoryStores {
        let stores = MemoryStores::new();
        for user in [&self.alice, &self.bob, &self.carol] {
            stores.users.insert(user.clone());
        }

        let mut room = Room::new(self.general, "general");
        room.add_member(self.alice.id, MemberRole::Admin);
        room.add_member(self.bob.id, MemberRole::Member);
        stores.rooms.insert(room);

        stores
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Inbound frames
// ============================================================================

pub fn join_room(room_id: RoomId) -> Value {
    json!({ "event": "join_room", "data": { "roomId": room_id } })
}

pub fn leave_room(room_id: RoomId) -> Value {
    json!({ "event": "leave_room", "data": { "roomId": room_id } })
}

pub fn send_message(room_id: RoomId, content: &str) -> Value {
    json!({ "event": "send_message", "data": { "roomId": room_id, "content": content } })
}

pub fn reply(room_id: RoomId, content: &str, reply_to: &str) -> Value {
    json!({
        "event": "send_message",
        "data": { "roomId": room_id, "content": content, "replyTo": reply_to }
    })
}

pub fn edit_message(message_id: &str, content: &str) -> Value {
    json!({ "event": "edit_message", "data": { "messageId": message_id, "content": content } })
}

pub fn delete_message(message_id: &str) -> Value {
    json!({ "event": "delete_message", "data": { "messageId": message_id } })
}

pub fn add_reaction(message_id: &str, emoji: &str) -> Value {
    json!({ "event": "add_reaction", "data": { "messageId": message_id, "emoji": emoji } })
}

pub fn remove_reaction(message_id: &str) -> Value {
    json!({ "event": "remove_reaction", "data": { "messageId": message_id } })
}

pub fn typing(room_id: RoomId, is_typing: bool) -> Value {
    json!({ "event": "typing", "data": { "roomId": room_id, "isTyping": is_typing } })
}

/// A message id no store knows
pub fn unknown_message() -> String {
    MessageId::new().to_string()
}
