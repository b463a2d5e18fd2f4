//! # parley-core
//!
//! Domain layer containing entities, typed ids, outbound events and the
//! ports (repository, quota and transport traits) the services depend on.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Identity, MemberRole, Message, MessageStatus, MessageType, Reaction, Room, RoomKind,
    RoomMember, User, DELETED_CONTENT, MAX_EMOJI_LENGTH,
};
pub use error::{DomainError, ErrorKind};
pub use events::{MessageView, ReplyPreview, ServerEvent, UserSummary};
pub use traits::{
    MessageRepository, QuotaDecision, QuotaPolicy, QuotaStore, RepoResult, RoomRepository,
    Transport, UserRepository,
};
pub use value_objects::{ConnectionId, IdParseError, MessageId, RoomId, UserId};
