//! Room service
//!
//! Channel subscriptions of one connection and the typing indicator.

use parley_core::{DomainError, Identity, RoomId, ServerEvent};
use tracing::{debug, info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::gate::RoomGate;
use super::message::MessageService;

/// Room service
pub struct RoomService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoomService<'a> {
    /// Create a new RoomService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Subscribe the connection and send it `room_messages`.
    ///
    /// History goes to the requesting connection only, oldest first.
    /// Returns the number of messages delivered.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn join(&self, identity: &Identity, room_id: RoomId) -> ServiceResult<usize> {
        let room = RoomGate::new(self.ctx)
            .authorize(identity.user_id, room_id)
            .await?;

        self.ctx.transport().join(identity.connection_id, room.id);

        let messages = MessageService::new(self.ctx)
            .history(room.id, self.ctx.chat().history_limit)
            .await?;
        let count = messages.len();

        self.ctx.transport().send_to(
            identity.connection_id,
            ServerEvent::RoomMessages {
                room_id: room.id,
                messages,
            },
        );

        info!(history = count, "Joined room");
        Ok(count)
    }

    /// Unsubscribe the connection; membership is left untouched
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub fn leave(&self, identity: &Identity, room_id: RoomId) {
        self.ctx.transport().leave(identity.connection_id, room_id);
        debug!("Left room channel");
    }

    /// Relay a typing indicator to the other connections on the channel
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub fn typing(&self, identity: &Identity, room_id: RoomId, is_typing: bool) -> ServiceResult<()> {
        if !self
            .ctx
            .transport()
            .is_subscribed(identity.connection_id, room_id)
        {
            return Err(DomainError::NotSubscribed(room_id).into());
        }

        self.ctx.transport().broadcast_room_except(
            room_id,
            identity.connection_id,
            &ServerEvent::UserTyping {
                room_id,
                user_id: identity.user_id,
                user_name: identity.display_name.clone(),
                is_typing,
            },
        );
        Ok(())
    }
}
