//! In-memory RoomRepository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use parley_core::entities::{MemberRole, Room};
use parley_core::error::DomainError;
use parley_core::traits::{RepoResult, RoomRepository};
use parley_core::value_objects::{MessageId, RoomId, UserId};

/// Process-local room store
#[derive(Clone, Default)]
pub struct MemoryRoomRepository {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
}

impl MemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a room
    pub fn insert(&self, room: Room) {
        self.rooms.write().insert(room.id, room);
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

#[async_trait]
impl RoomRepository for MemoryRoomRepository {
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>> {
        Ok(self.rooms.read().get(&id).cloned())
    }

    async fn find_by_member(&self, user_id: UserId) -> RepoResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .rooms
            .read()
            .values()
            .filter(|room| room.is_member(user_id))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rooms)
    }

    async fn is_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<bool> {
        Ok(self
            .rooms
            .read()
            .get(&room_id)
            .is_some_and(|room| room.is_member(user_id)))
    }

    async fn create(&self, room: &Room) -> RepoResult<()> {
        self.insert(room.clone());
        Ok(())
    }

    async fn add_member(&self, room_id: RoomId, user_id: UserId, role: MemberRole) -> RepoResult<()> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(&room_id)
            .ok_or(DomainError::RoomNotFound(room_id))?;
        room.add_member(user_id, role);
        Ok(())
    }

    async fn remove_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<()> {
        if let Some(room) = self.rooms.write().get_mut(&room_id) {
            room.remove_member(user_id);
        }
        Ok(())
    }

    async fn set_last_message(&self, room_id: RoomId, message_id: MessageId) -> RepoResult<()> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(&room_id)
            .ok_or(DomainError::RoomNotFound(room_id))?;
        room.set_last_message(message_id);
        Ok(())
    }
}
