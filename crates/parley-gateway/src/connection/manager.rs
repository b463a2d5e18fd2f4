//! Connection manager
//!
//! Registry of live WebSocket connections using DashMap for thread-safe
//! access. It is the [`Transport`] the services fan out through.

use super::{Connection, Outbound};
use dashmap::DashMap;
use parley_core::{ConnectionId, Identity, RoomId, ServerEvent, Transport, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by connection id
    connections: DashMap<ConnectionId, Arc<Connection>>,

    /// User id to connection ids mapping
    user_connections: DashMap<UserId, HashSet<ConnectionId>>,

    /// Room id to subscribed connection ids mapping
    room_connections: DashMap<RoomId, HashSet<ConnectionId>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_connections: DashMap::new(),
            room_connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new authenticated connection
    pub fn add_connection(&self, identity: Identity, sender: mpsc::Sender<Outbound>) -> Arc<Connection> {
        let connection_id = identity.connection_id;
        let user_id = identity.user_id;
        let connection = Connection::new(identity, sender);

        self.connections.insert(connection_id, connection.clone());
        self.user_connections
            .entry(user_id)
            .or_default()
            .insert(connection_id);

        tracing::debug!(connection_id = %connection_id, user_id = %user_id, "Connection added");

        connection
    }

    /// Remove a connection and drop all of its room subscriptions
    ///
    /// Uses `alter` for atomic modify-and-cleanup operations.
    pub fn remove_connection(&self, connection_id: ConnectionId) -> Option<Arc<Connection>> {
        let (_, connection) = self.connections.remove(&connection_id)?;

        self.user_connections
            .alter(&connection.user_id(), |_, mut connections| {
                connections.remove(&connection_id);
                connections
            });
        self.user_connections
            .remove_if(&connection.user_id(), |_, connections| connections.is_empty());

        for room_id in connection.rooms() {
            self.room_connections.alter(&room_id, |_, mut connections| {
                connections.remove(&connection_id);
                connections
            });
        }
        self.room_connections
            .retain(|_, connections| !connections.is_empty());

        tracing::debug!(connection_id = %connection_id, "Connection removed");
        Some(connection)
    }

    /// Get a connection by id
    pub fn get_connection(&self, connection_id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&connection_id).map(|r| r.clone())
    }

    /// Get all connections of a user
    pub fn get_user_connections(&self, user_id: UserId) -> Vec<Arc<Connection>> {
        self.collect(self.user_connections.get(&user_id).map(|ids| ids.clone()))
    }

    /// Get all connections subscribed to a room
    pub fn get_room_connections(&self, room_id: RoomId) -> Vec<Arc<Connection>> {
        self.collect(self.room_connections.get(&room_id).map(|ids| ids.clone()))
    }

    fn collect(&self, ids: Option<HashSet<ConnectionId>>) -> Vec<Arc<Connection>> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.get_connection(*id))
                .collect()
        })
        .unwrap_or_default()
    }

    fn deliver<'a>(
        connections: impl IntoIterator<Item = &'a Arc<Connection>>,
        except: Option<ConnectionId>,
        event: &ServerEvent,
    ) -> usize {
        connections
            .into_iter()
            .filter(|conn| Some(conn.id()) != except)
            .filter(|conn| conn.try_send(event.clone()))
            .count()
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of users with at least one connection
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    /// Get the number of rooms with at least one subscriber
    pub fn room_count(&self) -> usize {
        self.room_connections.len()
    }

    /// Close every connection, used on shutdown
    pub fn close_all(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.close(None))
            .count()
    }
}

impl Transport for ConnectionManager {
    fn join(&self, connection_id: ConnectionId, room_id: RoomId) {
        let Some(connection) = self.get_connection(connection_id) else {
            tracing::debug!(connection_id = %connection_id, "Join for unknown connection");
            return;
        };
        connection.subscribe_room(room_id);
        self.room_connections
            .entry(room_id)
            .or_default()
            .insert(connection_id);

        tracing::trace!(connection_id = %connection_id, room_id = %room_id, "Subscribed to room");
    }

    fn leave(&self, connection_id: ConnectionId, room_id: RoomId) {
        if let Some(connection) = self.get_connection(connection_id) {
            connection.unsubscribe_room(room_id);
        }
        self.room_connections.alter(&room_id, |_, mut connections| {
            connections.remove(&connection_id);
            connections
        });
        self.room_connections
            .remove_if(&room_id, |_, connections| connections.is_empty());

        tracing::trace!(connection_id = %connection_id, room_id = %room_id, "Unsubscribed from room");
    }

    fn is_subscribed(&self, connection_id: ConnectionId, room_id: RoomId) -> bool {
        self.room_connections
            .get(&room_id)
            .is_some_and(|connections| connections.contains(&connection_id))
    }

    fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        self.get_connection(connection_id)
            .is_some_and(|conn| conn.try_send(event))
    }

    fn broadcast_room(&self, room_id: RoomId, event: &ServerEvent) -> usize {
        Self::deliver(&self.get_room_connections(room_id), None, event)
    }

    fn broadcast_room_except(
        &self,
        room_id: RoomId,
        except: ConnectionId,
        event: &ServerEvent,
    ) -> usize {
        Self::deliver(&self.get_room_connections(room_id), Some(except), event)
    }

    fn broadcast_except(&self, except: ConnectionId, event: &ServerEvent) -> usize {
        let connections: Vec<_> = self.connections.iter().map(|r| r.clone()).collect();
        let sent = Self::deliver(&connections, Some(except), event);
        tracing::debug!(sent, event = event.name(), "Event broadcast to all connections");
        sent
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("users", &self.user_connections.len())
            .field("rooms", &self.room_connections.len())
            .finish()
    }
}
