//! # parley-gateway
//!
//! WebSocket gateway: token handshake, the live connection registry that
//! implements [`Transport`](parley_core::Transport), and routing of inbound
//! client events to the services.

pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use connection::{Connection, ConnectionManager, Outbound};
pub use protocol::{ClientEvent, CloseCode};
pub use server::{create_app, create_gateway_state, run, serve, GatewayState};
