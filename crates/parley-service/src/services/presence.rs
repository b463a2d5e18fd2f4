//! Presence tracker
//!
//! Keeps the set of live connections per user. A user is online while the
//! set is non-empty; closing one of several devices does not flip presence.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parley_core::{ConnectionId, UserId};

#[derive(Debug, Default)]
struct Entry {
    connections: HashSet<ConnectionId>,
    last_seen: Option<DateTime<Utc>>,
}

/// Point-in-time view of one user's presence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub user_id: UserId,
    pub online: bool,
    pub connections: usize,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Process-wide presence map
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    entries: Arc<DashMap<UserId, Entry>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection; true if it is the user's first one
    pub fn attach(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let mut entry = self.entries.entry(user_id).or_default();
        let was_offline = entry.connections.is_empty();
        entry.connections.insert(connection_id) && was_offline
    }

    /// Drop a connection; true if it was the user's last one
    pub fn detach(&self, user_id: UserId, connection_id: ConnectionId, at: DateTime<Utc>) -> bool {
        let Some(mut entry) = self.entries.get_mut(&user_id) else {
            return false;
        };
        if !entry.connections.remove(&connection_id) {
            return false;
        }
        if entry.connections.is_empty() {
            entry.last_seen = Some(at);
            true
        } else {
            false
        }
    }

    pub fn presence(&self, user_id: UserId) -> Option<PresenceSnapshot> {
        self.entries.get(&user_id).map(|entry| PresenceSnapshot {
            user_id,
            online: !entry.connections.is_empty(),
            connections: entry.connections.len(),
            last_seen: entry.last_seen,
        })
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.entries
            .get(&user_id)
            .is_some_and(|entry| !entry.connections.is_empty())
    }

    /// Users with at least one live connection
    pub fn online_users(&self) -> Vec<UserId> {
        self.entries
            .iter()
            .filter(|entry| !entry.connections.is_empty())
            .map(|entry| *entry.key())
            .collect()
    }

    /// Live connections of a user
    pub fn connections_of(&self, user_id: UserId) -> Vec<ConnectionId> {
        self.entries
            .get(&user_id)
            .map(|entry| entry.connections.iter().copied().collect())
            .unwrap_or_default()
    }
}
