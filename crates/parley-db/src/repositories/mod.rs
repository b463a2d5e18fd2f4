//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in parley-core.
//! Each repository handles database operations for a specific domain entity.

mod error;
mod message;
mod room;
mod user;

pub use message::PgMessageRepository;
pub use room::PgRoomRepository;
pub use user::PgUserRepository;
