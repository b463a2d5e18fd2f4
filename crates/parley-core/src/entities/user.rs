//! User entity - an identity as recorded by the identity store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ConnectionId, UserId};

/// User record, including the presence fields the gateway writes through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub connection_id: Option<ConnectionId>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new offline user
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar: None,
            is_online: false,
            connection_id: None,
            last_seen: None,
        }
    }

    /// Set the avatar reference
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Record a new live connection
    pub fn go_online(&mut self, connection_id: ConnectionId, at: DateTime<Utc>) {
        self.is_online = true;
        self.connection_id = Some(connection_id);
        self.last_seen = Some(at);
    }

    /// Record that the last live connection went away
    pub fn go_offline(&mut self, at: DateTime<Utc>) {
        self.is_online = false;
        self.connection_id = None;
        self.last_seen = Some(at);
    }
}

/// The authenticated principal bound to one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
    pub connection_id: ConnectionId,
}

impl Identity {
    pub fn new(user: &User, connection_id: ConnectionId) -> Self {
        Self {
            user_id: user.id,
            display_name: user.display_name.clone(),
            connection_id,
        }
    }
}
