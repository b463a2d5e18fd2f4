//! Domain entities - core business objects

mod message;
mod reaction;
mod room;
mod user;

pub use message::{Message, MessageStatus, MessageType, DELETED_CONTENT};
pub use reaction::{Reaction, MAX_EMOJI_LENGTH};
pub use room::{MemberRole, Room, RoomKind, RoomMember};
pub use user::{Identity, User};
