//! Quota store port - backing state for the token-bucket rate limiter

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::repositories::RepoResult;

/// Limits for one bucket class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Length of one window
    pub window: Duration,
    /// Calls allowed per window
    pub max: u32,
}

impl QuotaPolicy {
    pub const fn new(window: Duration, max: u32) -> Self {
        Self { window, max }
    }

    /// Window length in milliseconds
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Outcome of taking one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// Whole seconds until the window resets; zero when allowed
    pub retry_after_secs: u64,
}

impl QuotaDecision {
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }

    /// Reject with `remaining_ms` left in the window, rounded up to seconds
    pub fn reject(remaining_ms: i64) -> Self {
        let ms = u64::try_from(remaining_ms.max(1)).unwrap_or(1);
        Self {
            allowed: false,
            retry_after_secs: ms.div_ceil(1000),
        }
    }
}

/// Storage for rate buckets keyed by an opaque string
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Count one call against `key`.
    ///
    /// A missing or expired bucket is recreated with a fresh deadline of
    /// `now + window`. When the count has reached `policy.max` the call is
    /// rejected and the count left untouched.
    async fn take(
        &self,
        key: &str,
        policy: QuotaPolicy,
        now: DateTime<Utc>,
    ) -> RepoResult<QuotaDecision>;
}
