//! Session service
//!
//! Connect and disconnect transitions of one authenticated connection:
//! presence, write-through to the user store, room subscriptions and the
//! online/offline broadcasts.

use chrono::Utc;
use parley_core::{DomainError, Identity, RoomId, ServerEvent, UserSummary};
use tracing::{info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Session service
pub struct SessionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SessionService<'a> {
    /// Create a new SessionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Bring a new connection online and subscribe it to the user's rooms.
    ///
    /// Sends `connected` to the connection and, for the user's first live
    /// connection, `user_online` to everyone else. Returns the joined rooms.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, connection_id = %identity.connection_id))]
    pub async fn connect(&self, identity: &Identity) -> ServiceResult<Vec<RoomId>> {
        let user_id = identity.user_id;
        let conn = identity.connection_id;

        let mut user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        let first = self.ctx.presence().attach(user_id, conn);
        let now = Utc::now();

        let rooms = match self.persist_online(identity, now).await {
            Ok(rooms) => rooms,
            Err(e) => {
                self.ctx.presence().detach(user_id, conn, now);
                return Err(e);
            }
        };

        for room_id in &rooms {
            self.ctx.transport().join(conn, *room_id);
        }

        self.ctx.transport().send_to(
            conn,
            ServerEvent::Connected {
                user_id,
                rooms: rooms.clone(),
            },
        );

        if first {
            user.go_online(conn, now);
            let event = ServerEvent::UserOnline {
                user_id,
                user: UserSummary::from(&user),
            };
            self.ctx.transport().broadcast_except(conn, &event);
        }

        info!(rooms = rooms.len(), first, "Session connected");
        Ok(rooms)
    }

    async fn persist_online(
        &self,
        identity: &Identity,
        now: chrono::DateTime<Utc>,
    ) -> ServiceResult<Vec<RoomId>> {
        self.ctx
            .user_repo()
            .mark_online(identity.user_id, identity.connection_id, now)
            .await?;
        let rooms = self.ctx.room_repo().find_by_member(identity.user_id).await?;
        Ok(rooms.into_iter().map(|room| room.id).collect())
    }

    /// Detach a closed connection.
    ///
    /// Room subscriptions are dropped by the transport. When this was the
    /// user's last connection the user is persisted offline and
    /// `user_offline` goes to everyone else.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, connection_id = %identity.connection_id))]
    pub async fn disconnect(&self, identity: &Identity) -> ServiceResult<()> {
        let user_id = identity.user_id;
        let now = Utc::now();

        if !self
            .ctx
            .presence()
            .detach(user_id, identity.connection_id, now)
        {
            // Repoint the stored connection at a device that is still open
            if let Some(remaining) = self.ctx.presence().connections_of(user_id).pop() {
                self.ctx
                    .user_repo()
                    .mark_online(user_id, remaining, now)
                    .await?;
            }
            info!("Session closed, other connections remain");
            return Ok(());
        }

        self.ctx.user_repo().mark_offline(user_id, now).await?;

        let Some(user) = self.ctx.user_repo().find_by_id(user_id).await? else {
            warn!("User vanished before offline broadcast");
            return Ok(());
        };

        let event = ServerEvent::UserOffline {
            user_id,
            user: UserSummary::from(&user),
        };
        self.ctx
            .transport()
            .broadcast_except(identity.connection_id, &event);

        info!("Session closed, user offline");
        Ok(())
    }
}
