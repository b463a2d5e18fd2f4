//! Room authorization gate
//!
//! Membership is always read from the room store, never from connection
//! state.

use parley_core::{DomainError, Room, RoomId, UserId};
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

pub struct RoomGate<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoomGate<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load the room and require `user_id` to be a member
    #[instrument(skip(self))]
    pub async fn authorize(&self, user_id: UserId, room_id: RoomId) -> ServiceResult<Room> {
        let room = self
            .ctx
            .room_repo()
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound(room_id))?;

        if !room.is_member(user_id) {
            debug!(user_id = %user_id, room_id = %room_id, "Rejected non-member");
            return Err(DomainError::NotRoomMember(room_id).into());
        }

        Ok(room)
    }

    /// Membership check for an already known room id
    pub async fn require_member(&self, user_id: UserId, room_id: RoomId) -> ServiceResult<()> {
        if self.ctx.room_repo().is_member(room_id, user_id).await? {
            Ok(())
        } else {
            Err(DomainError::NotRoomMember(room_id).into())
        }
    }
}
