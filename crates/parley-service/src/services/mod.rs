//! Business logic services
//!
//! Use cases behind every inbound gateway event, plus the rate limiter,
//! presence tracker and room gate they share.

pub mod context;
pub mod error;
pub mod gate;
pub mod message;
pub mod presence;
pub mod rate_limit;
pub mod reaction;
pub mod room;
pub mod session;

// Re-export all services for convenience
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult, GENERIC_FAILURE};
pub use gate::RoomGate;
pub use message::MessageService;
pub use presence::{PresenceSnapshot, PresenceTracker};
pub use rate_limit::{BucketClass, RateLimiter};
pub use reaction::ReactionService;
pub use room::RoomService;
pub use session::SessionService;
