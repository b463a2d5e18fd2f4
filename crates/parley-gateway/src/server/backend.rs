//! Store and quota backend selection
//!
//! PostgreSQL when `DATABASE_URL` is set, otherwise in-memory stores
//! (optionally seeded). Redis buckets when `REDIS_URL` is set, otherwise
//! process-local buckets purged by a background sweeper.

use chrono::Utc;
use parley_cache::{MemoryQuotaStore, RedisPool, RedisQuotaStore};
use parley_common::{AppConfig, AppError};
use parley_core::{MessageRepository, QuotaStore, RoomRepository, UserRepository};
use parley_db::{MemoryStores, PgPool, SeedData};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// The three stores the services write through
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Repositories {
    pub fn memory(stores: &MemoryStores) -> Self {
        Self {
            users: Arc::new(stores.users.clone()),
            rooms: Arc::new(stores.rooms.clone()),
            messages: Arc::new(stores.messages.clone()),
        }
    }

    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(parley_db::PgUserRepository::new(pool.clone())),
            rooms: Arc::new(parley_db::PgRoomRepository::new(pool.clone())),
            messages: Arc::new(parley_db::PgMessageRepository::new(pool.clone())),
        }
    }

    /// Connect the configured backend
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        if let Some(db) = &config.database {
            tracing::info!("Connecting to PostgreSQL...");
            let pool = parley_db::create_pool(db)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            if db.run_migrations {
                parley_db::run_migrations(&pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            tracing::info!("PostgreSQL connection established");
            return Ok(Self::postgres(&pool));
        }

        let stores = match &config.seed_file {
            Some(path) => {
                let seed = SeedData::load(path)
                    .await
                    .map_err(|e| AppError::config(format!("{}: {e}", path.display())))?;
                tracing::info!(
                    users = seed.users.len(),
                    rooms = seed.rooms.len(),
                    "In-memory stores seeded"
                );
                MemoryStores::seeded(seed)
            }
            None => MemoryStores::new(),
        };
        tracing::warn!("DATABASE_URL not set, using in-memory stores");
        Ok(Self::memory(&stores))
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

/// Where rate buckets live
#[derive(Debug, Clone)]
pub enum QuotaBackend {
    Memory(Arc<MemoryQuotaStore>),
    Redis(Arc<RedisQuotaStore>),
}

impl QuotaBackend {
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryQuotaStore::new()))
    }

    /// Connect the configured backend, failing fast if Redis is unreachable
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        match &config.redis {
            Some(redis) => {
                tracing::info!("Connecting to Redis...");
                let pool =
                    RedisPool::from_config(redis).map_err(|e| AppError::Cache(e.to_string()))?;
                pool.health_check().await.map_err(|e| AppError::Cache(e.to_string()))?;
                tracing::info!("Redis quota store ready");
                Ok(Self::Redis(Arc::new(RedisQuotaStore::new(pool))))
            }
            None => {
                tracing::warn!("REDIS_URL not set, rate limits are per process");
                Ok(Self::memory())
            }
        }
    }

    pub fn store(&self) -> Arc<dyn QuotaStore> {
        match self {
            Self::Memory(store) => store.clone(),
            Self::Redis(store) => store.clone(),
        }
    }

    /// Periodically purge expired in-process buckets.
    ///
    /// Redis expires its own keys, so nothing is spawned for it.
    pub fn spawn_sweeper(&self, every: Duration) -> Option<JoinHandle<()>> {
        let Self::Memory(store) = self else {
            return None;
        };
        let store = Arc::clone(store);

        Some(tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                store.purge_expired(Utc::now());
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::test_config;
    use parley_core::{QuotaPolicy, UserId};

    #[tokio::test]
    async fn test_memory_backend_without_database() {
        let config = test_config();
        let repos = Repositories::from_config(&config).await.unwrap();
        assert!(repos.users.find_by_id(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_config_error() {
        let mut config = test_config();
        config.seed_file = Some("/nonexistent/parley-seed.json".into());
        let err = Repositories::from_config(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_sweeper_purges_memory_buckets() {
        let backend = QuotaBackend::memory();
        let QuotaBackend::Memory(store) = &backend else {
            panic!("expected memory backend");
        };

        let policy = QuotaPolicy::new(Duration::from_millis(10), 1);
        let past = Utc::now() - chrono::Duration::seconds(5);
        backend.store().take("message:x", policy, past).await.unwrap();
        assert_eq!(store.len(), 1);

        let sweeper = backend.spawn_sweeper(Duration::from_millis(10)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_quota_without_redis() {
        let backend = QuotaBackend::from_config(&test_config()).await.unwrap();
        assert!(matches!(backend, QuotaBackend::Memory(_)));
    }
}
