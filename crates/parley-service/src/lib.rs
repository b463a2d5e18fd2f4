//! # parley-service
//!
//! Application layer: rate limiting, presence, the room gate and the
//! session, room, message and reaction use cases. Every operation writes
//! through the repository ports first and only then fans out through the
//! [`Transport`](parley_core::Transport).

pub mod dto;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use services::{
    BucketClass, MessageService, PresenceSnapshot, PresenceTracker, RateLimiter, ReactionService,
    RoomGate, RoomService, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
    SessionService,
};
