//! # parley-db
//!
//! Store layer implementing the repository traits of `parley-core`.
//!
//! ## Overview
//!
//! Two backends are provided:
//!
//! - PostgreSQL via SQLx: connection pool, `FromRow` models, entity
//!   mappers, repositories and SQL migrations.
//! - In-memory: `parking_lot`-guarded maps, optionally seeded from JSON.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parley_db::{create_pool, run_migrations, PgUserRepository};
//!
//! let pool = create_pool(&config.database).await?;
//! run_migrations(&pool).await?;
//! let users = PgUserRepository::new(pool);
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{
    MemoryMessageRepository, MemoryRoomRepository, MemoryStores, MemoryUserRepository, SeedData,
    SeedError,
};
pub use pool::{create_pool, run_migrations, PgPool, MIGRATIONS_DIR};
pub use repositories::{PgMessageRepository, PgRoomRepository, PgUserRepository};
