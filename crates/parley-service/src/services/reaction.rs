//! Reaction service
//!
//! One reaction per user per message; setting a new emoji replaces the old
//! one. Both operations broadcast the full reaction list.

use parley_core::{
    DomainError, Identity, Message, MessageId, Reaction, ServerEvent, MAX_EMOJI_LENGTH,
};
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::dto::{AddReactionRequest, RemoveReactionRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::gate::RoomGate;
use super::rate_limit::BucketClass;

/// Reaction service
pub struct ReactionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReactionService<'a> {
    /// Create a new ReactionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load a live message, require membership and count one reaction call
    async fn reactable(&self, identity: &Identity, message_id: MessageId) -> ServiceResult<Message> {
        let message = self
            .ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .ok_or(DomainError::MessageNotFound(message_id))?;

        if message.is_deleted() {
            return Err(DomainError::MessageDeleted.into());
        }

        RoomGate::new(self.ctx)
            .require_member(identity.user_id, message.room_id)
            .await?;

        self.ctx
            .rate_limiter()
            .enforce(identity.user_id, BucketClass::Reaction)
            .await?;

        Ok(message)
    }

    fn broadcast(&self, message: &Message, reactions: Vec<Reaction>) {
        let reached = self.ctx.transport().broadcast_room(
            message.room_id,
            &ServerEvent::ReactionUpdated {
                message_id: message.id,
                reactions,
            },
        );
        debug!(reached, "reaction_updated fanned out");
    }

    /// Set the caller's reaction, replacing any previous one
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, message_id = %request.message_id))]
    pub async fn add(
        &self,
        identity: &Identity,
        request: AddReactionRequest,
    ) -> ServiceResult<Vec<Reaction>> {
        request.validate()?;
        let emoji = request.emoji.trim();
        if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_LENGTH {
            return Err(ServiceError::validation("Emoji must be 1-32 characters"));
        }

        let message = self.reactable(identity, request.message_id).await?;

        let reactions = self
            .ctx
            .message_repo()
            .set_reaction(message.id, &Reaction::new(identity.user_id, emoji))
            .await?;

        info!(emoji, "Reaction set");
        self.broadcast(&message, reactions.clone());
        Ok(reactions)
    }

    /// Remove the caller's reaction; a no-op when there is none
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, message_id = %request.message_id))]
    pub async fn remove(
        &self,
        identity: &Identity,
        request: RemoveReactionRequest,
    ) -> ServiceResult<Vec<Reaction>> {
        let message = self.reactable(identity, request.message_id).await?;

        if !message.reactions.iter().any(|r| r.user_id == identity.user_id) {
            debug!("No reaction to remove");
            return Ok(message.reactions);
        }

        let reactions = self
            .ctx
            .message_repo()
            .remove_reaction(message.id, identity.user_id)
            .await?;

        info!("Reaction removed");
        self.broadcast(&message, reactions.clone());
        Ok(reactions)
    }
}
