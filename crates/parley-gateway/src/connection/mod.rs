//! Connection management
//!
//! Live WebSocket connections and the registry that routes events to them.

mod connection;
mod manager;

pub use connection::{Connection, Outbound};
pub use manager::ConnectionManager;
