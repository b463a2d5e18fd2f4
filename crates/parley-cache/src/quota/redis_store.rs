//! Redis-backed quota store
//!
//! Runs the bucket algorithm as a Lua script so the read-check-increment is
//! atomic across every gateway instance sharing the Redis server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Script;
use tracing::warn;

use parley_core::error::DomainError;
use parley_core::traits::{QuotaDecision, QuotaPolicy, QuotaStore, RepoResult};

use crate::pool::{RedisPool, RedisPoolError, RedisResult};

/// Key prefix for rate buckets
const QUOTA_PREFIX: &str = "parley:quota:";

/// KEYS[1] bucket hash; ARGV now_ms, window_ms, max.
/// Returns {allowed, remaining_ms}.
const TAKE_SCRIPT: &str = r"
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local max = tonumber(ARGV[3])
local count = tonumber(redis.call('HGET', KEYS[1], 'count') or '0')
local reset_at = tonumber(redis.call('HGET', KEYS[1], 'reset_at') or '0')

if reset_at <= now then
    count = 0
    reset_at = now + window
    redis.call('HSET', KEYS[1], 'count', 0, 'reset_at', reset_at)
    redis.call('PEXPIRE', KEYS[1], window)
end

if count >= max then
    return {0, reset_at - now}
end

redis.call('HINCRBY', KEYS[1], 'count', 1)
return {1, 0}
";

/// Quota store shared through Redis
#[derive(Clone)]
pub struct RedisQuotaStore {
    pool: RedisPool,
    script: Script,
}

impl std::fmt::Debug for RedisQuotaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQuotaStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl RedisQuotaStore {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            script: Script::new(TAKE_SCRIPT),
        }
    }

    fn key(key: &str) -> String {
        format!("{QUOTA_PREFIX}{key}")
    }

    async fn run(&self, key: &str, policy: QuotaPolicy, now_ms: i64) -> RedisResult<QuotaDecision> {
        let mut conn = self.pool.get().await?;
        let reply: Vec<i64> = self
            .script
            .key(Self::key(key))
            .arg(now_ms)
            .arg(policy.window_ms())
            .arg(policy.max)
            .invoke_async(&mut conn)
            .await?;

        match reply.as_slice() {
            [1, _] => Ok(QuotaDecision::allow()),
            [0, remaining_ms] => Ok(QuotaDecision::reject(*remaining_ms)),
            other => Err(RedisPoolError::UnexpectedReply(format!("{other:?}"))),
        }
    }
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    async fn take(
        &self,
        key: &str,
        policy: QuotaPolicy,
        now: DateTime<Utc>,
    ) -> RepoResult<QuotaDecision> {
        self.run(key, policy, now.timestamp_millis())
            .await
            .map_err(|e| {
                warn!(error = %e, key, "Quota check failed");
                DomainError::CacheError(e.to_string())
            })
    }
}
