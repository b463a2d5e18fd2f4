//! Room entity - a channel with an explicit member list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageId, RoomId, UserId};

/// Room kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    #[default]
    Group,
    Direct,
}

impl RoomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Direct => "direct",
        }
    }

    /// Parse the stored representation, falling back to `Group`
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "direct" => Self::Direct,
            _ => Self::Group,
        }
    }
}

/// Role a member holds inside a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Moderator,
    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Member => "member",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            _ => Self::Member,
        }
    }
}

/// One entry of a room's member list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    pub user_id: UserId,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default = "Utc::now")]
    pub joined_at: DateTime<Utc>,
}

impl RoomMember {
    pub fn new(user_id: UserId, role: MemberRole) -> Self {
        Self {
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// Room entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub kind: RoomKind,
    #[serde(default)]
    pub members: Vec<RoomMember>,
    #[serde(default)]
    pub last_message_id: Option<MessageId>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Create an empty group room
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            kind: RoomKind::Group,
            members: Vec::new(),
            last_message_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a direct room between two users
    pub fn direct(id: RoomId, name: impl Into<String>, a: UserId, b: UserId) -> Self {
        let mut room = Self::new(id, name);
        room.kind = RoomKind::Direct;
        room.add_member(a, MemberRole::Member);
        room.add_member(b, MemberRole::Member);
        room
    }

    /// Check membership
    #[inline]
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    /// Get a member entry
    pub fn member(&self, user_id: UserId) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// Add a member; returns false if already present
    pub fn add_member(&mut self, user_id: UserId, role: MemberRole) -> bool {
        if self.is_member(user_id) {
            return false;
        }
        self.members.push(RoomMember::new(user_id, role));
        self.updated_at = Utc::now();
        true
    }

    /// Remove a member; returns false if absent
    pub fn remove_member(&mut self, user_id: UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.user_id != user_id);
        let removed = self.members.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Point the room at its newest message
    pub fn set_last_message(&mut self, message_id: MessageId) {
        self.last_message_id = Some(message_id);
        self.updated_at = Utc::now();
    }
}
