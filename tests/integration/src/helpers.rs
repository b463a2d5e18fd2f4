//! Test helpers for integration tests
//!
//! Provides a gateway spawned on an ephemeral port over in-memory stores,
//! and a small WebSocket client speaking the event protocol.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use parley_common::{
    AppConfig, AppSettings, ChatConfig, ConnectionConfig, Environment, JwtConfig,
    RateLimitConfig, ServerConfig,
};
use parley_core::{User, UserId};
use parley_gateway::server::{build_state, QuotaBackend, Repositories};
use parley_gateway::{serve, GatewayState};
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::fixtures::Seed;

/// How long to wait for an expected frame
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Secret shared by the test server and the tokens it is given
pub const TEST_SECRET: &str = "integration-test-secret";

/// Create a test configuration with no external backends
pub fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "parley-integration".to_string(),
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

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub seed: Seed,
    pub state: GatewayState,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let seed = Seed::new();
        let stores = seed.stores();

        let state = build_state(config, Repositories::memory(&stores), &QuotaBackend::memory())?;

        // Bind to an ephemeral port
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        // Spawn server task
        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            serve(listener, server_state).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            seed,
            state,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Issue an access token the server accepts
    pub fn token_for(&self, user_id: UserId) -> Result<String> {
        Ok(self.state.jwt_service().issue_access_token(user_id)?)
    }

    /// Gateway URL carrying a token
    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/gateway?token={}", self.addr, token)
    }

    /// Open a WebSocket as `user` and consume the `connected` event
    pub async fn connect(&self, user: &User) -> Result<WsClient> {
        let token = self.token_for(user.id)?;
        let (stream, _) = connect_async(self.ws_url(&token)).await?;
        let mut client = WsClient { stream };

        let connected = client.expect("connected").await?;
        if connected["data"]["userId"] != Value::String(user.id.to_string()) {
            bail!("connected for the wrong user: {connected}");
        }
        Ok(client)
    }
}

/// A connected gateway client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Wrap an already-upgraded stream
    pub fn from_stream(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self { stream }
    }

    /// Send one event frame
    pub async fn send(&mut self, event: Value) -> Result<()> {
        self.stream.send(Message::Text(event.to_string())).await?;
        Ok(())
    }

    /// Send raw bytes as a binary frame
    pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.stream.send(Message::Binary(bytes)).await?;
        Ok(())
    }

    /// Next event frame, skipping control frames
    pub async fn recv(&mut self) -> Result<Value> {
        tokio::time::timeout(RECV_TIMEOUT, self.next_event())
            .await
            .map_err(|_| anyhow!("timed out waiting for an event"))?
    }

    async fn next_event(&mut self) -> Result<Value> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
                Some(Ok(Message::Close(frame))) => bail!("connection closed: {frame:?}"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => bail!("connection ended"),
            }
        }
    }

    /// Next event frame, which must be named `name`
    pub async fn expect(&mut self, name: &str) -> Result<Value> {
        let event = self.recv().await?;
        if event["event"] != name {
            bail!("expected {name}, got {event}");
        }
        Ok(event)
    }

    /// Skip frames until one named `name` arrives
    pub async fn wait_for(&mut self, name: &str) -> Result<Value> {
        loop {
            let event = self.recv().await?;
            if event["event"] == name {
                return Ok(event);
            }
        }
    }

    /// Assert no event frame arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.next_event()).await {
            Err(_) => Ok(()),
            Ok(Ok(event)) => bail!("expected silence, got {event}"),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Wait for the server to close the socket; returns its close frame
    pub async fn closed(&mut self) -> Result<Option<CloseFrame<'static>>> {
        let wait = async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Close(frame))) => return Ok(frame),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(anyhow::Error::from(e)),
                    None => return Ok(None),
                }
            }
        };
        tokio::time::timeout(RECV_TIMEOUT, wait)
            .await
            .map_err(|_| anyhow!("timed out waiting for close"))?
    }

    /// Close the socket from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        // Drain until the server acknowledges
        while let Some(Ok(_)) = self.stream.next().await {}
        Ok(())
    }
}
