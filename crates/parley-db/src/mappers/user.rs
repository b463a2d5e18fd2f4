//! User entity <-> model mapper

use parley_core::entities::User;
use parley_core::value_objects::{ConnectionId, UserId};

use crate::models::UserModel;

/// Convert UserModel to User entity
impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: UserId::from_uuid(model.id),
            display_name: model.display_name,
            avatar: model.avatar,
            is_online: model.is_online,
            connection_id: model.connection_id.map(ConnectionId::from_uuid),
            last_seen: model.last_seen,
        }
    }
}
