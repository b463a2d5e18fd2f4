//! Shared fixtures for gateway tests

use super::{build_state, GatewayState, QuotaBackend, Repositories};
use crate::connection::Outbound;
use crate::Connection;
use parley_common::{
    AppConfig, AppSettings, ChatConfig, ConnectionConfig, Environment, JwtConfig,
    RateLimitConfig, ServerConfig,
};
use parley_core::{ConnectionId, Identity, MemberRole, Room, RoomId, User, UserId};
use parley_db::MemoryStores;
use parley_service::SessionService;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const TEST_SECRET: &str = "parley-test-secret";

/// Configuration with no external backends
pub fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "parley-test".to_string(),
            env: Environment::Development,
        },
        gateway: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: None,
        redis: None,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry: 900,
        },
        chat: ChatConfig::default(),
        rate_limit: RateLimitConfig::default(),
        connection: ConnectionConfig::default(),
        seed_file: None,
    }
}

/// In-memory gateway state with one room.
///
/// `alice` and `bob` are members of `room`; `carol` is not.
pub struct TestGateway {
    pub state: GatewayState,
    pub stores: MemoryStores,
    pub room: RoomId,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

impl TestGateway {
    pub fn new() -> Self {
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

        let state = build_state(
            test_config(),
            Repositories::memory(&stores),
            &QuotaBackend::memory(),
        )
        .expect("test gateway state");

        Self {
            state,
            stores,
            room: room_id,
            alice,
            bob,
            carol,
        }
    }

    pub fn token_for(&self, user_id: UserId) -> String {
        self.state
            .jwt_service()
            .issue_access_token(user_id)
            .expect("issue token")
    }

    /// Register a connection and run the connect transition for it
    pub async fn connect(&self, user: &User) -> (Arc<Connection>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(64);
        let identity = Identity::new(user, ConnectionId::new());
        let connection = self
            .state
            .connection_manager()
            .add_connection(identity.clone(), tx);
        SessionService::new(self.state.service_context())
            .connect(&identity)
            .await
            .expect("session connect");
        (connection, rx)
    }
}
