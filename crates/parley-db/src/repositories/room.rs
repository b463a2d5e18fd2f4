//! PostgreSQL implementation of RoomRepository

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use parley_core::entities::{MemberRole, Room};
use parley_core::traits::{RepoResult, RoomRepository};
use parley_core::value_objects::{MessageId, RoomId, UserId};

use crate::mappers::room_from_parts;
use crate::models::{RoomMemberModel, RoomModel};

use super::error::{map_db_error, map_fk_violation, room_not_found};

/// PostgreSQL implementation of RoomRepository
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new PgRoomRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn members_of(&self, room_ids: &[Uuid]) -> RepoResult<Vec<RoomMemberModel>> {
        sqlx::query_as::<_, RoomMemberModel>(
            r"
            SELECT room_id, user_id, role, joined_at
            FROM room_members
            WHERE room_id = ANY($1)
            ORDER BY joined_at
            ",
        )
        .bind(room_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>> {
        let Some(model) = sqlx::query_as::<_, RoomModel>(
            r"
            SELECT id, name, kind, last_message_id, created_at, updated_at
            FROM rooms
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

        let members = self.members_of(&[model.id]).await?;
        Ok(Some(room_from_parts(model, members)))
    }

    #[instrument(skip(self))]
    async fn find_by_member(&self, user_id: UserId) -> RepoResult<Vec<Room>> {
        let models = sqlx::query_as::<_, RoomModel>(
            r"
            SELECT r.id, r.name, r.kind, r.last_message_id, r.created_at, r.updated_at
            FROM rooms r
            INNER JOIN room_members m ON m.room_id = r.id
            WHERE m.user_id = $1
            ORDER BY r.updated_at DESC
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut grouped: HashMap<Uuid, Vec<RoomMemberModel>> = HashMap::new();
        for member in self.members_of(&ids).await? {
            grouped.entry(member.room_id).or_default().push(member);
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let members = grouped.remove(&model.id).unwrap_or_default();
                room_from_parts(model, members)
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn is_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<bool> {
        let result: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(SELECT 1 FROM room_members WHERE room_id = $1 AND user_id = $2)
            ",
        )
        .bind(room_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.0)
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    async fn create(&self, room: &Room) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO rooms (id, name, kind, last_message_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(room.id.into_inner())
        .bind(&room.name)
        .bind(room.kind.as_str())
        .bind(room.last_message_id.map(MessageId::into_inner))
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        for member in &room.members {
            sqlx::query(
                r"
                INSERT INTO room_members (room_id, user_id, role, joined_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (room_id, user_id) DO NOTHING
                ",
            )
            .bind(room.id.into_inner())
            .bind(member.user_id.into_inner())
            .bind(member.role.as_str())
            .bind(member.joined_at)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_member(&self, room_id: RoomId, user_id: UserId, role: MemberRole) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO room_members (room_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (room_id, user_id) DO NOTHING
            ",
        )
        .bind(room_id.into_inner())
        .bind(user_id.into_inner())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_fk_violation(e, || room_not_found(room_id)))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<()> {
        sqlx::query("DELETE FROM room_members WHERE room_id = $1 AND user_id = $2")
            .bind(room_id.into_inner())
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_last_message(&self, room_id: RoomId, message_id: MessageId) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE rooms
            SET last_message_id = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(room_id.into_inner())
        .bind(message_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(room_not_found(room_id));
        }

        Ok(())
    }
}
