//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use parley_core::entities::User;
use parley_core::traits::{RepoResult, UserRepository};
use parley_core::value_objects::{ConnectionId, UserId};

use crate::models::UserModel;

use super::error::{map_db_error, user_not_found};

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a user record
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn upsert(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, display_name, avatar, is_online, connection_id, last_seen)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET display_name = EXCLUDED.display_name, avatar = EXCLUDED.avatar
            ",
        )
        .bind(user.id.into_inner())
        .bind(&user.display_name)
        .bind(user.avatar.as_deref())
        .bind(user.is_online)
        .bind(user.connection_id.map(ConnectionId::into_inner))
        .bind(user.last_seen)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, display_name, avatar, is_online, connection_id, last_seen
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(User::from))
    }

    #[instrument(skip(self))]
    async fn mark_online(
        &self,
        id: UserId,
        connection_id: ConnectionId,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET is_online = TRUE, connection_id = $2, last_seen = $3
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .bind(connection_id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_offline(&self, id: UserId, last_seen: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET is_online = FALSE, connection_id = NULL, last_seen = $2
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .bind(last_seen)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }
}
