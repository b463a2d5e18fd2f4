//! In-memory UserRepository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use parley_core::entities::User;
use parley_core::error::DomainError;
use parley_core::traits::{RepoResult, UserRepository};
use parley_core::value_objects::{ConnectionId, UserId};

/// Process-local user store
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user
    pub fn insert(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn mark_online(
        &self,
        id: UserId,
        connection_id: ConnectionId,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.go_online(connection_id, at);
        Ok(())
    }

    async fn mark_offline(&self, id: UserId, last_seen: DateTime<Utc>) -> RepoResult<()> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.go_offline(last_seen);
        Ok(())
    }
}
