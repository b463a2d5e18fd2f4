//! Token-bucket rate limiter
//!
//! One bucket per (user, class). The bucket state itself lives in a
//! [`QuotaStore`] so the same limiter works against the in-process store
//! and against Redis.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_common::RateLimitConfig;
use parley_core::traits::{QuotaDecision, QuotaPolicy, QuotaStore};
use parley_core::{DomainError, UserId};
use tracing::{debug, instrument};

use super::error::ServiceResult;

/// Operation class a bucket is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketClass {
    MessageSend,
    Reaction,
}

impl BucketClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageSend => "message",
            Self::Reaction => "reaction",
        }
    }
}

impl fmt::Display for BucketClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate limiter shared by every connection
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn QuotaStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Window and maximum for a class
    pub fn policy(&self, class: BucketClass) -> QuotaPolicy {
        match class {
            BucketClass::MessageSend => QuotaPolicy::new(
                Duration::from_millis(self.config.message_window_ms),
                self.config.message_max,
            ),
            BucketClass::Reaction => QuotaPolicy::new(
                Duration::from_millis(self.config.reaction_window_ms),
                self.config.reaction_max,
            ),
        }
    }

    fn key(user_id: UserId, class: BucketClass) -> String {
        format!("{class}:{user_id}")
    }

    /// Count one call now
    pub async fn check(&self, user_id: UserId, class: BucketClass) -> ServiceResult<QuotaDecision> {
        self.check_at(user_id, class, Utc::now()).await
    }

    /// Count one call at an explicit instant
    #[instrument(skip(self))]
    pub async fn check_at(
        &self,
        user_id: UserId,
        class: BucketClass,
        now: DateTime<Utc>,
    ) -> ServiceResult<QuotaDecision> {
        let decision = self
            .store
            .take(&Self::key(user_id, class), self.policy(class), now)
            .await?;

        if !decision.allowed {
            debug!(
                user_id = %user_id,
                class = %class,
                retry_after = decision.retry_after_secs,
                "Rate limit hit"
            );
        }

        Ok(decision)
    }

    /// Count one call and turn a rejection into `RateLimited`
    pub async fn enforce(&self, user_id: UserId, class: BucketClass) -> ServiceResult<()> {
        let decision = self.check(user_id, class).await?;
        if decision.allowed {
            Ok(())
        } else {
            Err(DomainError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            }
            .into())
        }
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
