//! Transport port - delivery of events to live connections
//!
//! Delivery is best effort. Implementations never block on a slow
//! connection; they drop the event for it instead.

use crate::events::ServerEvent;
use crate::value_objects::{ConnectionId, RoomId};

pub trait Transport: Send + Sync {
    /// Subscribe a connection to a room channel
    fn join(&self, connection_id: ConnectionId, room_id: RoomId);

    /// Unsubscribe a connection from a room channel
    fn leave(&self, connection_id: ConnectionId, room_id: RoomId);

    /// Whether a connection is currently subscribed to a room channel
    fn is_subscribed(&self, connection_id: ConnectionId, room_id: RoomId) -> bool;

    /// Deliver to one connection; returns false if it could not be queued
    fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) -> bool;

    /// Deliver to every connection on a room channel; returns the count reached
    fn broadcast_room(&self, room_id: RoomId, event: &ServerEvent) -> usize;

    /// Deliver to a room channel, skipping one connection
    fn broadcast_room_except(
        &self,
        room_id: RoomId,
        except: ConnectionId,
        event: &ServerEvent,
    ) -> usize;

    /// Deliver to every live connection but one
    fn broadcast_except(&self, except: ConnectionId, event: &ServerEvent) -> usize;
}
