//! # parley-cache
//!
//! Quota storage for the token-bucket rate limiter.
//!
//! ## Features
//!
//! - **In-process store**: `DashMap` buckets with periodic purging
//! - **Redis store**: atomic Lua bucket script, shared by every instance
//! - **Connection Pool**: managed Redis connection pool with deadpool
//!
//! ## Example
//!
//! ```ignore
//! use parley_cache::{RedisPool, RedisQuotaStore};
//!
//! let pool = RedisPool::from_config(&redis_config)?;
//! let quotas = RedisQuotaStore::new(pool);
//! ```

pub mod pool;
pub mod quota;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export quota stores
pub use quota::{MemoryQuotaStore, RedisQuotaStore};
