//! In-memory MessageRepository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use parley_core::entities::{Message, Reaction};
use parley_core::error::DomainError;
use parley_core::traits::{MessageRepository, RepoResult};
use parley_core::value_objects::{MessageId, RoomId, UserId};

#[derive(Default)]
struct Inner {
    messages: HashMap<MessageId, Message>,
    /// Message ids per room in insertion (chronological) order
    timelines: HashMap<RoomId, Vec<MessageId>>,
}

/// Process-local message store
#[derive(Clone, Default)]
pub struct MemoryMessageRepository {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.inner.read().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().messages.is_empty()
    }

    fn with_message<T>(
        &self,
        id: MessageId,
        f: impl FnOnce(&mut Message) -> T,
    ) -> RepoResult<T> {
        let mut inner = self.inner.write();
        let message = inner
            .messages
            .get_mut(&id)
            .ok_or(DomainError::MessageNotFound(id))?;
        Ok(f(message))
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>> {
        Ok(self.inner.read().messages.get(&id).cloned())
    }

    async fn find_recent(&self, room_id: RoomId, limit: i64) -> RepoResult<Vec<Message>> {
        let limit = usize::try_from(limit.clamp(1, 100)).unwrap_or(1);
        let inner = self.inner.read();
        let Some(timeline) = inner.timelines.get(&room_id) else {
            return Ok(Vec::new());
        };

        Ok(timeline
            .iter()
            .rev()
            .filter_map(|id| inner.messages.get(id).cloned())
            .take(limit)
            .collect())
    }

    async fn create(&self, message: &Message) -> RepoResult<()> {
        let mut inner = self.inner.write();
        inner.messages.insert(message.id, message.clone());
        inner
            .timelines
            .entry(message.room_id)
            .or_default()
            .push(message.id);
        Ok(())
    }

    async fn update(&self, message: &Message) -> RepoResult<()> {
        self.with_message(message.id, |stored| {
            if stored.is_deleted() {
                return Err(DomainError::MessageDeleted);
            }
            stored.content.clone_from(&message.content);
            stored.message_type = message.message_type;
            stored.status = message.status;
            stored.edited_at = message.edited_at;
            Ok(())
        })?
    }

    async fn set_reaction(
        &self,
        message_id: MessageId,
        reaction: &Reaction,
    ) -> RepoResult<Vec<Reaction>> {
        self.with_message(message_id, |stored| {
            stored.set_reaction(reaction.clone());
            stored.reactions.clone()
        })
    }

    async fn remove_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
    ) -> RepoResult<Vec<Reaction>> {
        self.with_message(message_id, |stored| {
            stored.remove_reaction(user_id);
            stored.reactions.clone()
        })
    }
}
