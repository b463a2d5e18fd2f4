//! Individual WebSocket connection
//!
//! Represents a single authenticated WebSocket connection and its state.

use crate::protocol::CloseCode;
use parking_lot::{Mutex, RwLock};
use parley_core::{ConnectionId, Identity, RoomId, ServerEvent, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Frames queued for the socket writer
#[derive(Debug, Clone)]
pub enum Outbound {
    /// A JSON event frame
    Event(ServerEvent),
    /// Heartbeat ping
    Ping,
    /// Close the socket, with a gateway close code when the server ends it
    Close(Option<CloseCode>),
}

/// A single WebSocket connection
pub struct Connection {
    /// Identity bound at handshake
    identity: Identity,

    /// Channel to the socket writer
    sender: mpsc::Sender<Outbound>,

    /// Room channels this connection is subscribed to
    rooms: RwLock<HashSet<RoomId>>,

    /// Last pong received
    last_pong: Mutex<Instant>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    pub fn new(identity: Identity, sender: mpsc::Sender<Outbound>) -> Arc<Self> {
        Arc::new(Self {
            identity,
            sender,
            rooms: RwLock::new(HashSet::new()),
            last_pong: Mutex::new(Instant::now()),
            created_at: Instant::now(),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn id(&self) -> ConnectionId {
        self.identity.connection_id
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    /// Queue an event without waiting.
    ///
    /// A full or closed queue drops the event for this connection only.
    pub fn try_send(&self, event: ServerEvent) -> bool {
        match self.sender.try_send(Outbound::Event(event)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::debug!(
                    connection_id = %self.id(),
                    frame = ?frame_name(&dropped),
                    "Send queue full, event dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection_id = %self.id(), "Send queue closed, event dropped");
                false
            }
        }
    }

    /// Queue a heartbeat ping
    pub fn ping(&self) -> bool {
        self.sender.try_send(Outbound::Ping).is_ok()
    }

    /// Ask the writer to close the socket
    pub fn close(&self, code: Option<CloseCode>) -> bool {
        self.sender.try_send(Outbound::Close(code)).is_ok()
    }

    /// Record a pong received
    pub fn record_pong(&self) {
        *self.last_pong.lock() = Instant::now();
    }

    /// Get time since last pong
    pub fn time_since_pong(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Add a room subscription; false if already subscribed
    pub fn subscribe_room(&self, room_id: RoomId) -> bool {
        self.rooms.write().insert(room_id)
    }

    /// Remove a room subscription; false if it was not subscribed
    pub fn unsubscribe_room(&self, room_id: RoomId) -> bool {
        self.rooms.write().remove(&room_id)
    }

    /// Get all subscribed rooms
    pub fn rooms(&self) -> Vec<RoomId> {
        self.rooms.read().iter().copied().collect()
    }

    /// Check if subscribed to a room
    pub fn is_subscribed_to(&self, room_id: RoomId) -> bool {
        self.rooms.read().contains(&room_id)
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Check if the writer side has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

fn frame_name(frame: &Outbound) -> &'static str {
    match frame {
        Outbound::Event(event) => event.name(),
        Outbound::Ping => "ping",
        Outbound::Close(_) => "close",
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connection_id", &self.identity.connection_id)
            .field("user_id", &self.identity.user_id)
            .field("rooms", &self.rooms.read().len())
            .field("created_at", &self.created_at)
            .finish()
    }
}
