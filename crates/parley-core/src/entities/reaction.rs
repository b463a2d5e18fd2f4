//! Reaction entity - one user's emoji on a message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Maximum emoji length in characters
pub const MAX_EMOJI_LENGTH: usize = 32;

/// Reaction entity. A message holds at most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub user_id: UserId,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    /// Create a new Reaction
    pub fn new(user_id: UserId, emoji: impl Into<String>) -> Self {
        Self {
            user_id,
            emoji: emoji.into(),
            created_at: Utc::now(),
        }
    }

    /// Check if reaction uses a specific emoji
    #[inline]
    pub fn is_emoji(&self, emoji: &str) -> bool {
        self.emoji == emoji
    }
}
