//! JSON seed data for the in-memory store

use std::path::Path;

use parley_core::entities::{Room, User};
use serde::Deserialize;
use thiserror::Error;

/// Users and rooms to preload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

/// Seed loading errors
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Room {room} lists unknown member {user}")]
    UnknownMember { room: String, user: String },
}

impl SeedData {
    /// Parse seed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let seed: Self = serde_json::from_str(json)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Read seed data from a JSON file
    pub async fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    /// Every room member must be a known user
    fn validate(&self) -> Result<(), SeedError> {
        for room in &self.rooms {
            for member in &room.members {
                if !self.users.iter().any(|u| u.id == member.user_id) {
                    return Err(SeedError::UnknownMember {
                        room: room.name.clone(),
                        user: member.user_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
