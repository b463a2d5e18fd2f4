//! Client event handlers
//!
//! Decodes inbound text frames and routes each event to its service. Every
//! failure becomes a single `error` event for the initiating connection.

mod error;
mod heartbeat;

pub use error::{HandlerError, HandlerResult, INVALID_PAYLOAD};
pub use heartbeat::Heartbeat;

use crate::connection::Connection;
use crate::protocol::ClientEvent;
use crate::server::GatewayState;
use parley_service::{MessageService, ReactionService, RoomService};
use std::sync::Arc;

/// Dispatch decoded client events to the services
pub struct EventRouter;

impl EventRouter {
    /// Handle one decoded client event
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        event: ClientEvent,
    ) -> HandlerResult<()> {
        let ctx = state.service_context();
        let identity = connection.identity();

        match event {
            ClientEvent::JoinRoom(req) => {
                RoomService::new(ctx).join(identity, req.room_id).await?;
            }
            ClientEvent::LeaveRoom(req) => {
                RoomService::new(ctx).leave(identity, req.room_id);
            }
            ClientEvent::Typing(req) => {
                RoomService::new(ctx).typing(identity, req.room_id, req.is_typing)?;
            }
            ClientEvent::SendMessage(req) => {
                MessageService::new(ctx).send(identity, req).await?;
            }
            ClientEvent::EditMessage(req) => {
                MessageService::new(ctx).edit(identity, req).await?;
            }
            ClientEvent::DeleteMessage(req) => {
                MessageService::new(ctx).delete(identity, req).await?;
            }
            ClientEvent::AddReaction(req) => {
                ReactionService::new(ctx).add(identity, req).await?;
            }
            ClientEvent::RemoveReaction(req) => {
                ReactionService::new(ctx).remove(identity, req).await?;
            }
        }

        Ok(())
    }
}

/// Decode and handle one text frame, reporting any failure to the sender
pub async fn handle_text(state: &GatewayState, connection: &Arc<Connection>, text: &str) {
    let result = match ClientEvent::from_json(text) {
        Ok(event) => {
            tracing::trace!(
                connection_id = %connection.id(),
                event = event.name(),
                "Received event"
            );
            EventRouter::dispatch(state, connection, event).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(err) = result {
        report(connection, &err);
    }
}

fn report(connection: &Connection, err: &HandlerError) {
    if err.is_internal() {
        tracing::error!(
            connection_id = %connection.id(),
            user_id = %connection.user_id(),
            error = %err,
            "Event handling failed"
        );
    } else {
        tracing::debug!(
            connection_id = %connection.id(),
            error = %err,
            "Event rejected"
        );
    }
    connection.try_send(err.to_event());
}
