//! Message and Reaction entity <-> model mapper

use parley_core::entities::{Message, MessageStatus, MessageType, Reaction};
use parley_core::value_objects::{MessageId, RoomId, UserId};

use crate::models::{MessageModel, ReactionModel};

impl From<ReactionModel> for Reaction {
    fn from(model: ReactionModel) -> Self {
        Reaction {
            user_id: UserId::from_uuid(model.user_id),
            emoji: model.emoji,
            created_at: model.created_at,
        }
    }
}

/// Build a Message from its row and reaction rows
pub fn message_from_parts(model: MessageModel, reactions: Vec<ReactionModel>) -> Message {
    Message {
        id: MessageId::from_uuid(model.id),
        room_id: RoomId::from_uuid(model.room_id),
        sender_id: UserId::from_uuid(model.sender_id),
        content: model.content,
        message_type: MessageType::parse(&model.message_type).unwrap_or_default(),
        reply_to: model.reply_to.map(MessageId::from_uuid),
        reactions: reactions.into_iter().map(Reaction::from).collect(),
        status: MessageStatus::from_str_lossy(&model.status),
        edited_at: model.edited_at,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_message_from_parts() {
        let id = Uuid::new_v4();
        let user = Uuid::new_v4();
        let model = MessageModel {
            id,
            room_id: Uuid::new_v4(),
            sender_id: user,
            content: "This message was deleted".to_string(),
            message_type: "deleted".to_string(),
            reply_to: None,
            status: "deleted".to_string(),
            edited_at: Some(Utc::now()),
            created_at: Utc::now(),
        };
        let reactions = vec![ReactionModel {
            message_id: id,
            user_id: user,
            emoji: "👍".to_string(),
            created_at: Utc::now(),
        }];

        let message = message_from_parts(model, reactions);
        assert_eq!(message.id, MessageId::from_uuid(id));
        assert!(message.is_deleted());
        assert_eq!(message.message_type, MessageType::Deleted);
        assert_eq!(message.reactions.len(), 1);
        assert_eq!(message.reactions[0].user_id, UserId::from_uuid(user));
    }

    #[test]
    fn test_unknown_tags_fall_back() {
        let model = MessageModel {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            content: "hi".to_string(),
            message_type: "hologram".to_string(),
            reply_to: None,
            status: "???".to_string(),
            edited_at: None,
            created_at: Utc::now(),
        };
        let message = message_from_parts(model, Vec::new());
        assert_eq!(message.message_type, MessageType::Text);
        assert_eq!(message.status, MessageStatus::Active);
    }
}
