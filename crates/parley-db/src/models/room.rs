//! Room database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for rooms table
#[derive(Debug, Clone, FromRow)]
pub struct RoomModel {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub last_message_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for room_members table
#[derive(Debug, Clone, FromRow)]
pub struct RoomMemberModel {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}
