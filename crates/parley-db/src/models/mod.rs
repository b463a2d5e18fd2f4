//! Database models with SQLx `FromRow` derives

mod message;
mod room;
mod user;

pub use message::{MessageModel, ReactionModel};
pub use room::{RoomMemberModel, RoomModel};
pub use user::UserModel;
