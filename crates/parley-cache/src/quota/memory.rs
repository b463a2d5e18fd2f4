//! Process-local quota store

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use parley_core::traits::{QuotaDecision, QuotaPolicy, QuotaStore, RepoResult};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    reset_at: DateTime<Utc>,
}

impl Bucket {
    fn fresh(now: DateTime<Utc>, policy: QuotaPolicy) -> Self {
        Self {
            count: 0,
            reset_at: now + Duration::milliseconds(policy.window_ms()),
        }
    }
}

/// Buckets held in a `DashMap`; each `take` runs under the key's shard lock.
///
/// Limits only hold per process. Use the Redis store when several gateway
/// instances share traffic.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    buckets: DashMap<String, Bucket>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop buckets whose window has passed; returns how many were removed
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.reset_at > now);
        let purged = before.saturating_sub(self.buckets.len());
        if purged > 0 {
            debug!(purged, remaining = self.buckets.len(), "Purged expired rate buckets");
        }
        purged
    }

    /// Number of live buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn take(
        &self,
        key: &str,
        policy: QuotaPolicy,
        now: DateTime<Utc>,
    ) -> RepoResult<QuotaDecision> {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::fresh(now, policy));

        if now >= bucket.reset_at {
            *bucket = Bucket::fresh(now, policy);
        }

        if bucket.count >= policy.max {
            let remaining = bucket.reset_at.signed_duration_since(now);
            return Ok(QuotaDecision::reject(remaining.num_milliseconds()));
        }

        bucket.count += 1;
        Ok(QuotaDecision::allow())
    }
}
