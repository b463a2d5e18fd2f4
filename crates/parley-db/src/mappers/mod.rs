//! Entity <-> model mappers

mod message;
mod room;
mod user;

pub use message::message_from_parts;
pub use room::room_from_parts;
