//! Message service
//!
//! Handles message sending, editing, soft deletion and history.
//! Every write is persisted before anything is broadcast.

use chrono::{DateTime, Utc};
use parley_core::{
    DomainError, Identity, Message, MessageId, MessageType, MessageView, RoomId, ServerEvent,
    UserId,
};
use tracing::{debug, info, instrument, warn};

use crate::dto::{DeleteMessageRequest, EditMessageRequest, SendMessageRequest, ViewBuilder};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::gate::RoomGate;
use super::rate_limit::BucketClass;

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    /// Create a new MessageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Trimmed content, rejected when empty or over the configured length
    fn checked_content(&self, content: &str) -> ServiceResult<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::EmptyContent.into());
        }
        let max = self.ctx.chat().max_message_length;
        if content.chars().count() > max {
            return Err(DomainError::ContentTooLong { max }.into());
        }
        Ok(content.to_string())
    }

    fn checked_type(&self, tag: Option<&str>) -> ServiceResult<MessageType> {
        let Some(tag) = tag else {
            return Ok(MessageType::Text);
        };
        MessageType::parse(tag)
            .filter(|t| self.ctx.chat().is_type_allowed(*t))
            .ok_or_else(|| DomainError::InvalidMessageType(tag.to_string()).into())
    }

    /// Send a message and broadcast `new_message` to the room, sender included
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, room_id = %request.room_id))]
    pub async fn send(
        &self,
        identity: &Identity,
        request: SendMessageRequest,
    ) -> ServiceResult<MessageView> {
        let content = self.checked_content(&request.content)?;
        let message_type = self.checked_type(request.message_type.as_deref())?;

        let room = RoomGate::new(self.ctx)
            .authorize(identity.user_id, request.room_id)
            .await?;

        if let Some(reply_id) = request.reply_to {
            let target = self.ctx.message_repo().find_by_id(reply_id).await?;
            if !target.is_some_and(|m| m.room_id == room.id) {
                return Err(DomainError::InvalidReplyTarget(reply_id).into());
            }
        }

        self.ctx
            .rate_limiter()
            .enforce(identity.user_id, BucketClass::MessageSend)
            .await?;

        let message = Message::new(
            MessageId::new(),
            room.id,
            identity.user_id,
            content,
            message_type,
        )
        .with_reply(request.reply_to);

        // The view is built before the insert; a stored message is always broadcast
        let view = ViewBuilder::new(self.ctx).view(&message).await?;
        self.ctx.message_repo().create(&message).await?;

        if let Err(e) = self
            .ctx
            .room_repo()
            .set_last_message(room.id, message.id)
            .await
        {
            warn!(message_id = %message.id, error = %e, "Failed to update last message pointer");
        }

        info!(message_id = %message.id, "Message sent");

        let reached = self.ctx.transport().broadcast_room(
            room.id,
            &ServerEvent::NewMessage {
                message: view.clone(),
            },
        );
        debug!(reached, "new_message fanned out");

        Ok(view)
    }

    /// Load a message the caller may still modify.
    ///
    /// Order: exists, not deleted, inside the edit window, owned by the
    /// caller, caller still a member of its room.
    async fn modifiable(
        &self,
        user_id: UserId,
        message_id: MessageId,
        now: DateTime<Utc>,
    ) -> ServiceResult<Message> {
        let message = self
            .ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .ok_or(DomainError::MessageNotFound(message_id))?;

        if message.is_deleted() {
            return Err(DomainError::MessageDeleted.into());
        }
        if !message.within_edit_window(self.ctx.chat().edit_window(), now) {
            return Err(DomainError::EditWindowExpired.into());
        }
        if message.sender_id != user_id {
            return Err(DomainError::NotMessageSender.into());
        }

        RoomGate::new(self.ctx)
            .require_member(user_id, message.room_id)
            .await?;

        Ok(message)
    }

    /// Replace content and broadcast `message_updated`
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, message_id = %request.message_id))]
    pub async fn edit(
        &self,
        identity: &Identity,
        request: EditMessageRequest,
    ) -> ServiceResult<MessageView> {
        let content = self.checked_content(&request.content)?;
        let now = Utc::now();

        let mut message = self
            .modifiable(identity.user_id, request.message_id, now)
            .await?;
        message.edit(content, now);
        let view = ViewBuilder::new(self.ctx).view(&message).await?;
        self.ctx.message_repo().update(&message).await?;

        info!("Message edited");
        Ok(self.broadcast_updated(view))
    }

    /// Soft-delete and broadcast `message_updated`
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, message_id = %request.message_id))]
    pub async fn delete(
        &self,
        identity: &Identity,
        request: DeleteMessageRequest,
    ) -> ServiceResult<MessageView> {
        let now = Utc::now();

        let mut message = self
            .modifiable(identity.user_id, request.message_id, now)
            .await?;
        message.soft_delete(now);
        let view = ViewBuilder::new(self.ctx).view(&message).await?;
        self.ctx.message_repo().update(&message).await?;

        info!("Message deleted");
        Ok(self.broadcast_updated(view))
    }

    fn broadcast_updated(&self, view: MessageView) -> MessageView {
        self.ctx.transport().broadcast_room(
            view.room_id,
            &ServerEvent::MessageUpdated {
                message: view.clone(),
            },
        );
        view
    }

    /// Most recent messages of a room, oldest first
    #[instrument(skip(self))]
    pub async fn history(&self, room_id: RoomId, limit: i64) -> ServiceResult<Vec<MessageView>> {
        let mut messages = self.ctx.message_repo().find_recent(room_id, limit).await?;
        messages.reverse();
        ViewBuilder::new(self.ctx).views(&messages).await
    }
}
