//! Shared fixtures for service tests

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_cache::MemoryQuotaStore;
use parley_common::{ChatConfig, RateLimitConfig};
use parley_core::entities::{Identity, MemberRole, Room, User};
use parley_core::traits::{RepoResult, RoomRepository, Transport};
use parley_core::{ConnectionId, DomainError, MessageId, RoomId, ServerEvent, UserId};
use parley_db::{MemoryRoomRepository, MemoryStores};

use crate::services::ServiceContext;

/// Transport that records every delivery instead of writing to sockets
#[derive(Default)]
pub struct RecordingTransport {
    connections: Mutex<HashSet<ConnectionId>>,
    rooms: Mutex<HashMap<RoomId, HashSet<ConnectionId>>>,
    delivered: Mutex<Vec<(ConnectionId, ServerEvent)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a connection known so `broadcast_except` reaches it
    pub fn open(&self, connection_id: ConnectionId) {
        self.connections.lock().insert(connection_id);
    }

    /// Events delivered to one connection, in order
    pub fn events_for(&self, connection_id: ConnectionId) -> Vec<ServerEvent> {
        self.delivered
            .lock()
            .iter()
            .filter(|(conn, _)| *conn == connection_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Names of the events delivered to one connection
    pub fn names_for(&self, connection_id: ConnectionId) -> Vec<&'static str> {
        self.events_for(connection_id)
            .iter()
            .map(ServerEvent::name)
            .collect()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn clear(&self) {
        self.delivered.lock().clear();
    }

    fn deliver_all(&self, targets: impl IntoIterator<Item = ConnectionId>, event: &ServerEvent) -> usize {
        let mut delivered = self.delivered.lock();
        let mut count = 0;
        for conn in targets {
            delivered.push((conn, event.clone()));
            count += 1;
        }
        count
    }

    fn subscribers(&self, room_id: RoomId) -> Vec<ConnectionId> {
        self.rooms
            .lock()
            .get(&room_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Transport for RecordingTransport {
    fn join(&self, connection_id: ConnectionId, room_id: RoomId) {
        self.rooms.lock().entry(room_id).or_default().insert(connection_id);
    }

    fn leave(&self, connection_id: ConnectionId, room_id: RoomId) {
        if let Some(set) = self.rooms.lock().get_mut(&room_id) {
            set.remove(&connection_id);
        }
    }

    fn is_subscribed(&self, connection_id: ConnectionId, room_id: RoomId) -> bool {
        self.rooms
            .lock()
            .get(&room_id)
            .is_some_and(|set| set.contains(&connection_id))
    }

    fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        self.delivered.lock().push((connection_id, event));
        true
    }

    fn broadcast_room(&self, room_id: RoomId, event: &ServerEvent) -> usize {
        let targets = self.subscribers(room_id);
        self.deliver_all(targets, event)
    }

    fn broadcast_room_except(
        &self,
        room_id: RoomId,
        except: ConnectionId,
        event: &ServerEvent,
    ) -> usize {
        let targets: Vec<_> = self
            .subscribers(room_id)
            .into_iter()
            .filter(|conn| *conn != except)
            .collect();
        self.deliver_all(targets, event)
    }

    fn broadcast_except(&self, except: ConnectionId, event: &ServerEvent) -> usize {
        let targets: Vec<_> = self
            .connections
            .lock()
            .iter()
            .copied()
            .filter(|conn| *conn != except)
            .collect();
        self.deliver_all(targets, event)
    }
}

/// Room store that cannot move the last-message pointer
pub struct PointerFailingRooms(pub MemoryRoomRepository);

#[async_trait]
impl RoomRepository for PointerFailingRooms {
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>> {
        self.0.find_by_id(id).await
    }

    async fn find_by_member(&self, user_id: UserId) -> RepoResult<Vec<Room>> {
        self.0.find_by_member(user_id).await
    }

    async fn is_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<bool> {
        self.0.is_member(room_id, user_id).await
    }

    async fn create(&self, room: &Room) -> RepoResult<()> {
        self.0.create(room).await
    }

    async fn add_member(
        &self,
        room_id: RoomId,
        user_id: UserId,
        role: MemberRole,
    ) -> RepoResult<()> {
        self.0.add_member(room_id, user_id, role).await
    }

    async fn remove_member(&self, room_id: RoomId, user_id: UserId) -> RepoResult<()> {
        self.0.remove_member(room_id, user_id).await
    }

    async fn set_last_message(&self, _room_id: RoomId, _message_id: MessageId) -> RepoResult<()> {
        Err(DomainError::DatabaseError("connection reset".to_string()))
    }
}

/// In-memory stores, a recording transport and three users.
///
/// `alice` and `bob` are members of `room`; `carol` is not.
pub struct Fixture {
    pub ctx: ServiceContext,
    pub stores: MemoryStores,
    pub transport: Arc<RecordingTransport>,
    pub room: RoomId,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_limits(RateLimitConfig::default())
    }

    pub fn with_limits(limits: RateLimitConfig) -> Self {
        let stores = MemoryStores::new();
        let alice = User::new(UserId::new(), "alice");
        let bob = User::new(UserId::new(), "bob");
        let carol = User::new(UserId::new(), "carol");
        for user in [&alice, &bob, &carol] {
            stores.users.insert(user.clone());
        }

        let mut room = Room::new(RoomId::new(), "general");
        room.add_member(alice.id, MemberRole::Admin);
        room.add_member(bob.id, MemberRole::Member);
        let room_id = room.id;
        stores.rooms.insert(room);

        let transport = Arc::new(RecordingTransport::new());
        let ctx = ServiceContext::builder()
            .user_repo(Arc::new(stores.users.clone()))
            .room_repo(Arc::new(stores.rooms.clone()))
            .message_repo(Arc::new(stores.messages.clone()))
            .transport(transport.clone())
            .quota_store(Arc::new(MemoryQuotaStore::new()))
            .rate_limits(limits)
            .chat(ChatConfig::default())
            .build()
            .expect("fixture context");

        Self {
            ctx,
            stores,
            transport,
            room: room_id,
            alice,
            bob,
            carol,
        }
    }

    /// A context over the same stores and transport but another room store
    pub fn context_with_rooms(&self, rooms: Arc<dyn RoomRepository>) -> ServiceContext {
        ServiceContext::builder()
            .user_repo(Arc::new(self.stores.users.clone()))
            .room_repo(rooms)
            .message_repo(Arc::new(self.stores.messages.clone()))
            .transport(self.transport.clone())
            .quota_store(Arc::new(MemoryQuotaStore::new()))
            .rate_limits(RateLimitConfig::default())
            .chat(ChatConfig::default())
            .build()
            .expect("fixture context")
    }

    /// Open a connection for a user and subscribe it to the fixture room
    pub fn connect(&self, user: &User) -> Identity {
        let identity = Identity::new(user, ConnectionId::new());
        self.transport.open(identity.connection_id);
        if user.id != self.carol.id {
            self.transport.join(identity.connection_id, self.room);
        }
        identity
    }
}
