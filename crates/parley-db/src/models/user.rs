//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: Uuid,
    pub display_name: String,
    pub avatar: Option<String>,
    pub is_online: bool,
    pub connection_id: Option<Uuid>,
    pub last_seen: Option<DateTime<Utc>>,
}
