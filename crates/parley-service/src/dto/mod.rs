//! Data transfer objects for inbound events and outbound views
//!
//! This module provides:
//! - Request DTOs decoded from client events
//! - Mappers building the message views sent to clients

pub mod mappers;
pub mod requests;

pub use mappers::{ViewBuilder, UNKNOWN_SENDER};
pub use requests::{
    AddReactionRequest, DeleteMessageRequest, EditMessageRequest, JoinRoomRequest,
    LeaveRoomRequest, RemoveReactionRequest, SendMessageRequest, TypingRequest,
};
