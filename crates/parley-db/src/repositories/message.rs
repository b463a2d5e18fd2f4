//! PostgreSQL implementation of MessageRepository

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use parley_core::entities::{Message, Reaction};
use parley_core::error::DomainError;
use parley_core::traits::{MessageRepository, RepoResult};
use parley_core::value_objects::{MessageId, RoomId, UserId};

use crate::mappers::message_from_parts;
use crate::models::{MessageModel, ReactionModel};

use super::error::{map_db_error, map_fk_violation, message_not_found, room_not_found};

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn reactions_of(&self, message_ids: &[Uuid]) -> RepoResult<Vec<ReactionModel>> {
        sqlx::query_as::<_, ReactionModel>(
            r"
            SELECT message_id, user_id, emoji, created_at
            FROM message_reactions
            WHERE message_id = ANY($1)
            ORDER BY created_at
            ",
        )
        .bind(message_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn reaction_list(&self, message_id: MessageId) -> RepoResult<Vec<Reaction>> {
        let rows = self.reactions_of(&[message_id.into_inner()]).await?;
        Ok(rows.into_iter().map(Reaction::from).collect())
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>> {
        let Some(model) = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT id, room_id, sender_id, content, message_type, reply_to, status,
                   edited_at, created_at
            FROM messages
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        else {
            return Ok(None);
        };

        let reactions = self.reactions_of(&[model.id]).await?;
        Ok(Some(message_from_parts(model, reactions)))
    }

    #[instrument(skip(self))]
    async fn find_recent(&self, room_id: RoomId, limit: i64) -> RepoResult<Vec<Message>> {
        let limit = limit.clamp(1, 100);

        let models = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT id, room_id, sender_id, content, message_type, reply_to, status,
                   edited_at, created_at
            FROM messages
            WHERE room_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(room_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut grouped: HashMap<Uuid, Vec<ReactionModel>> = HashMap::new();
        for reaction in self.reactions_of(&ids).await? {
            grouped.entry(reaction.message_id).or_default().push(reaction);
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let reactions = grouped.remove(&model.id).unwrap_or_default();
                message_from_parts(model, reactions)
            })
            .collect())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn create(&self, message: &Message) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO messages (id, room_id, sender_id, content, message_type, reply_to,
                                  status, edited_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(message.id.into_inner())
        .bind(message.room_id.into_inner())
        .bind(message.sender_id.into_inner())
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(message.reply_to.map(MessageId::into_inner))
        .bind(message.status.as_str())
        .bind(message.edited_at)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_fk_violation(e, || room_not_found(message.room_id)))?;

        Ok(())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn update(&self, message: &Message) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET content = $2, message_type = $3, status = $4, edited_at = $5
            WHERE id = $1 AND status <> 'deleted'
            ",
        )
        .bind(message.id.into_inner())
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(message.status.as_str())
        .bind(message.edited_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            // Deleted is terminal; tell a lost race apart from a missing row
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM messages WHERE id = $1)")
                    .bind(message.id.into_inner())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_db_error)?;
            return Err(if exists {
                DomainError::MessageDeleted
            } else {
                message_not_found(message.id)
            });
        }

        Ok(())
    }

    #[instrument(skip(self, reaction), fields(user_id = %reaction.user_id))]
    async fn set_reaction(
        &self,
        message_id: MessageId,
        reaction: &Reaction,
    ) -> RepoResult<Vec<Reaction>> {
        sqlx::query(
            r"
            INSERT INTO message_reactions (message_id, user_id, emoji, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (message_id, user_id)
            DO UPDATE SET emoji = EXCLUDED.emoji
            ",
        )
        .bind(message_id.into_inner())
        .bind(reaction.user_id.into_inner())
        .bind(&reaction.emoji)
        .bind(reaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_fk_violation(e, || message_not_found(message_id)))?;

        self.reaction_list(message_id).await
    }

    #[instrument(skip(self))]
    async fn remove_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
    ) -> RepoResult<Vec<Reaction>> {
        sqlx::query("DELETE FROM message_reactions WHERE message_id = $1 AND user_id = $2")
            .bind(message_id.into_inner())
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        self.reaction_list(message_id).await
    }
}
