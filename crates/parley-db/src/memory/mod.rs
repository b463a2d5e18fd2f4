//! In-memory store implementations
//!
//! Used when no database is configured, and by tests. State lives for the
//! lifetime of the process.

mod message;
mod room;
mod seed;
mod user;

pub use message::MemoryMessageRepository;
pub use room::MemoryRoomRepository;
pub use seed::{SeedData, SeedError};
pub use user::MemoryUserRepository;

/// The three in-memory repositories, sharing nothing but a lifetime
#[derive(Clone, Default)]
pub struct MemoryStores {
    pub users: MemoryUserRepository,
    pub rooms: MemoryRoomRepository,
    pub messages: MemoryMessageRepository,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build stores preloaded with seed data
    pub fn seeded(seed: SeedData) -> Self {
        let stores = Self::new();
        for user in seed.users {
            stores.users.insert(user);
        }
        for room in seed.rooms {
            stores.rooms.insert(room);
        }
        stores
    }
}
