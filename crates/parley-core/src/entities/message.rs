//! Message entity - a chat message and its lifecycle

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::reaction::Reaction;
use crate::value_objects::{MessageId, RoomId, UserId};

/// Content a soft-deleted message carries
pub const DELETED_CONTENT: &str = "This message was deleted";

/// Message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
    System,
    Deleted,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
            Self::System => "system",
            Self::Deleted => "deleted",
        }
    }

    /// Parse a tag, `None` for anything unknown
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "text" => Self::Text,
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "file" => Self::File,
            "system" => Self::System,
            "deleted" => Self::Deleted,
            _ => return None,
        })
    }
}

/// Lifecycle status. `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Active,
    Edited,
    Deleted,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Edited => "edited",
            Self::Deleted => "deleted",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "edited" => Self::Edited,
            "deleted" => Self::Deleted,
            _ => Self::Active,
        }
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to: Option<MessageId>,
    pub reactions: Vec<Reaction>,
    pub status: MessageStatus,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new Message
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        sender_id: UserId,
        content: String,
        message_type: MessageType,
    ) -> Self {
        Self {
            id,
            room_id,
            sender_id,
            content,
            message_type,
            reply_to: None,
            reactions: Vec::new(),
            status: MessageStatus::Active,
            edited_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the message as a reply
    pub fn with_reply(mut self, reply_to: Option<MessageId>) -> Self {
        self.reply_to = reply_to;
        self
    }

    /// Check if message has been edited or deleted
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.status != MessageStatus::Active
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.status == MessageStatus::Deleted
    }

    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Whether the message is still young enough to be edited or deleted
    pub fn within_edit_window(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) < window
    }

    /// Replace the content
    pub fn edit(&mut self, content: String, at: DateTime<Utc>) {
        self.content = content;
        self.status = MessageStatus::Edited;
        self.edited_at = Some(at);
    }

    /// Soft delete: sentinel content, `deleted` tag and status. Reactions and
    /// reply references are left alone.
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.content = DELETED_CONTENT.to_string();
        self.message_type = MessageType::Deleted;
        self.status = MessageStatus::Deleted;
        self.edited_at = Some(at);
    }

    /// Set the user's reaction, replacing any earlier one.
    ///
    /// A replaced reaction keeps its place and its original `created_at`;
    /// the list stays ordered by first reaction.
    pub fn set_reaction(&mut self, reaction: Reaction) {
        match self
            .reactions
            .iter_mut()
            .find(|r| r.user_id == reaction.user_id)
        {
            Some(existing) => existing.emoji = reaction.emoji,
            None => self.reactions.push(reaction),
        }
    }

    /// Remove the user's reaction; returns false if there was none
    pub fn remove_reaction(&mut self, user_id: UserId) -> bool {
        let before = self.reactions.len();
        self.reactions.retain(|r| r.user_id != user_id);
        self.reactions.len() != before
    }
}
