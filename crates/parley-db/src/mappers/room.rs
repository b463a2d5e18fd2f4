//! Room entity <-> model mapper

use parley_core::entities::{MemberRole, Room, RoomKind, RoomMember};
use parley_core::value_objects::{MessageId, RoomId, UserId};

use crate::models::{RoomMemberModel, RoomModel};

impl From<RoomMemberModel> for RoomMember {
    fn from(model: RoomMemberModel) -> Self {
        RoomMember {
            user_id: UserId::from_uuid(model.user_id),
            role: MemberRole::from_str_lossy(&model.role),
            joined_at: model.joined_at,
        }
    }
}

/// Build a Room from its row and member rows
pub fn room_from_parts(model: RoomModel, members: Vec<RoomMemberModel>) -> Room {
    Room {
        id: RoomId::from_uuid(model.id),
        name: model.name,
        kind: RoomKind::from_str_lossy(&model.kind),
        members: members.into_iter().map(RoomMember::from).collect(),
        last_message_id: model.last_message_id.map(MessageId::from_uuid),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
