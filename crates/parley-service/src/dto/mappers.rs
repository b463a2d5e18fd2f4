//! Entity to view mappers
//!
//! Resolve the sender profile and reply target a `MessageView` carries.

use std::collections::HashMap;

use parley_core::{Message, MessageView, ReplyPreview, UserId, UserSummary};

use crate::services::{ServiceContext, ServiceResult};

/// Display name used when a sender record no longer exists
pub const UNKNOWN_SENDER: &str = "Unknown user";

fn unknown_sender(id: UserId) -> UserSummary {
    UserSummary {
        id,
        display_name: UNKNOWN_SENDER.to_string(),
        avatar: None,
        is_online: false,
        last_seen: None,
    }
}

/// Builds message views, caching sender lookups across a batch
pub struct ViewBuilder<'a> {
    ctx: &'a ServiceContext,
    senders: HashMap<UserId, UserSummary>,
}

impl<'a> ViewBuilder<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            senders: HashMap::new(),
        }
    }

    async fn sender(&mut self, id: UserId) -> ServiceResult<UserSummary> {
        if let Some(summary) = self.senders.get(&id) {
            return Ok(summary.clone());
        }
        let summary = self
            .ctx
            .user_repo()
            .find_by_id(id)
            .await?
            .map_or_else(|| unknown_sender(id), |user| UserSummary::from(&user));
        self.senders.insert(id, summary.clone());
        Ok(summary)
    }

    async fn reply_preview(&self, message: &Message) -> ServiceResult<Option<ReplyPreview>> {
        let Some(reply_id) = message.reply_to else {
            return Ok(None);
        };
        let target = self.ctx.message_repo().find_by_id(reply_id).await?;
        Ok(target.as_ref().map(ReplyPreview::from))
    }

    /// View of one message
    pub async fn view(&mut self, message: &Message) -> ServiceResult<MessageView> {
        let sender = self.sender(message.sender_id).await?;
        let reply_to = self.reply_preview(message).await?;
        Ok(MessageView::new(message, sender, reply_to))
    }

    /// Views of a batch, order preserved
    pub async fn views(&mut self, messages: &[Message]) -> ServiceResult<Vec<MessageView>> {
        let mut views = Vec::with_capacity(messages.len());
        for message in messages {
            views.push(self.view(message).await?);
        }
        Ok(views)
    }
}
