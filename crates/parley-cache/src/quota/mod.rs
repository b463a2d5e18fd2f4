//! Rate bucket storage

mod memory;
mod redis_store;

pub use memory::MemoryQuotaStore;
pub use redis_store::RedisQuotaStore;
