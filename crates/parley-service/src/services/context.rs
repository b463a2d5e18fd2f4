//! Service context - dependency container for services
//!
//! Holds the repositories, the transport, the rate limiter and the
//! presence tracker needed by services.

use std::sync::Arc;

use parley_common::{ChatConfig, RateLimitConfig};
use parley_core::traits::{
    MessageRepository, QuotaStore, RoomRepository, Transport, UserRepository,
};

use super::error::{ServiceError, ServiceResult};
use super::presence::PresenceTracker;
use super::rate_limit::RateLimiter;

/// Service context containing all dependencies
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    room_repo: Arc<dyn RoomRepository>,
    message_repo: Arc<dyn MessageRepository>,

    // Delivery
    transport: Arc<dyn Transport>,

    rate_limiter: RateLimiter,
    presence: PresenceTracker,
    chat: ChatConfig,
}

impl ServiceContext {
    /// Create a builder
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // ========================================================================
    // Repository accessors
    // ========================================================================

    /// Get user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get room repository
    pub fn room_repo(&self) -> &dyn RoomRepository {
        self.room_repo.as_ref()
    }

    /// Get message repository
    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    // ========================================================================
    // Runtime state accessors
    // ========================================================================

    /// Get the transport used for fan-out
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Message rules
    pub fn chat(&self) -> &ChatConfig {
        &self.chat
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("rate_limiter", &self.rate_limiter)
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

/// Builder for ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    room_repo: Option<Arc<dyn RoomRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    transport: Option<Arc<dyn Transport>>,
    quota_store: Option<Arc<dyn QuotaStore>>,
    rate_limits: Option<RateLimitConfig>,
    presence: Option<PresenceTracker>,
    chat: Option<ChatConfig>,
}

impl ServiceContextBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn room_repo(mut self, repo: Arc<dyn RoomRepository>) -> Self {
        self.room_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn quota_store(mut self, store: Arc<dyn QuotaStore>) -> Self {
        self.quota_store = Some(store);
        self
    }

    /// Override the default rate limits
    pub fn rate_limits(mut self, config: RateLimitConfig) -> Self {
        self.rate_limits = Some(config);
        self
    }

    /// Share an existing presence tracker
    pub fn presence(mut self, presence: PresenceTracker) -> Self {
        self.presence = Some(presence);
        self
    }

    /// Override the default message rules
    pub fn chat(mut self, chat: ChatConfig) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Build the service context
    ///
    /// Returns an error if any required dependency is missing.
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let quota_store = self
            .quota_store
            .ok_or_else(|| ServiceError::validation("quota_store is required"))?;

        Ok(ServiceContext {
            user_repo: self
                .user_repo
                .ok_or_else(|| ServiceError::validation("user_repo is required"))?,
            room_repo: self
                .room_repo
                .ok_or_else(|| ServiceError::validation("room_repo is required"))?,
            message_repo: self
                .message_repo
                .ok_or_else(|| ServiceError::validation("message_repo is required"))?,
            transport: self
                .transport
                .ok_or_else(|| ServiceError::validation("transport is required"))?,
            rate_limiter: RateLimiter::new(quota_store, self.rate_limits.unwrap_or_default()),
            presence: self.presence.unwrap_or_default(),
            chat: self.chat.unwrap_or_default(),
        })
    }
}
