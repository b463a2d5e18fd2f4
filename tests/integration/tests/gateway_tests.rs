//! Gateway Integration Tests
//!
//! Each test spawns a gateway over in-memory stores on an ephemeral port
//! and drives it with real WebSocket clients.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use integration_tests::{fixtures::*, test_config, TestServer};
use parley_common::RateLimitConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

const QUIET: Duration = Duration::from_millis(200);

fn message_id(event: &Value) -> String {
    event["data"]["message"]["id"]
        .as_str()
        .expect("message id")
        .to_string()
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_handshake_requires_valid_token() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/gateway").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_AUTH");

    match connect_async(server.ws_url("not-a-jwt")).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("handshake accepted a bad token"),
    }
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.token_for(server.seed.alice.id).unwrap();

    // Without upgrade headers the token is still checked first
    let response = server
        .client
        .get(format!("{}/gateway", server.base_url()))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_connect_subscribes_to_member_rooms() {
    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.token_for(server.seed.alice.id).unwrap();
    let (stream, _) = connect_async(server.ws_url(&token)).await.unwrap();
    let mut alice = integration_tests::WsClient::from_stream(stream);

    let connected = alice.expect("connected").await.unwrap();
    assert_eq!(
        connected["data"]["rooms"],
        json!([server.seed.general.to_string()])
    );
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_presence_online_and_offline() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    let bob = server.connect(&server.seed.bob).await.unwrap();
    let online = alice.expect("user_online").await.unwrap();
    assert_eq!(online["data"]["userId"], server.seed.bob.id.to_string());
    assert_eq!(online["data"]["user"]["isOnline"], true);

    bob.close().await.unwrap();
    let offline = alice.expect("user_offline").await.unwrap();
    assert_eq!(offline["data"]["userId"], server.seed.bob.id.to_string());
    assert_eq!(offline["data"]["user"]["isOnline"], false);
    assert!(offline["data"]["user"]["lastSeen"].is_string());
}

#[tokio::test]
async fn test_second_device_keeps_user_online() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut bob = server.connect(&server.seed.bob).await.unwrap();

    let phone = server.connect(&server.seed.alice).await.unwrap();
    bob.expect("user_online").await.unwrap();
    let laptop = server.connect(&server.seed.alice).await.unwrap();

    phone.close().await.unwrap();
    bob.expect_silence(QUIET).await.unwrap();

    laptop.close().await.unwrap();
    bob.expect("user_offline").await.unwrap();
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_send_message_reaches_room() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();
    let mut bob = server.connect(&server.seed.bob).await.unwrap();
    alice.expect("user_online").await.unwrap();

    alice.send(send_message(room, "hello")).await.unwrap();

    for client in [&mut alice, &mut bob] {
        let event = client.expect("new_message").await.unwrap();
        let message = &event["data"]["message"];
        assert_eq!(message["content"], "hello");
        assert_eq!(message["messageType"], "text");
        assert_eq!(message["edited"], false);
        assert_eq!(message["reactions"], json!([]));
        assert_eq!(message["sender"]["displayName"], "alice");
    }
}

#[tokio::test]
async fn test_reply_carries_preview() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    alice.send(send_message(room, "question?")).await.unwrap();
    let original = message_id(&alice.expect("new_message").await.unwrap());

    alice.send(reply(room, "answer", &original)).await.unwrap();
    let event = alice.expect("new_message").await.unwrap();
    assert_eq!(event["data"]["message"]["replyTo"]["id"], original);
    assert_eq!(event["data"]["message"]["replyTo"]["content"], "question?");
}

#[tokio::test]
async fn test_non_member_is_denied() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();
    let mut carol = server.connect(&server.seed.carol).await.unwrap();
    alice.expect("user_online").await.unwrap();

    carol.send(send_message(room, "let me in")).await.unwrap();
    let error = carol.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "NOT_ROOM_MEMBER");

    carol.send(join_room(room)).await.unwrap();
    let error = carol.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "NOT_ROOM_MEMBER");

    alice.expect_silence(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_rate_limit_ninth_message() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    for i in 0..8 {
        alice.send(send_message(room, &format!("m{i}"))).await.unwrap();
        alice.expect("new_message").await.unwrap();
    }

    alice.send(send_message(room, "one too many")).await.unwrap();
    let error = alice.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "RATE_LIMITED");
    assert!(error["data"]["retryAfter"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_rate_limit_is_configurable() {
    let mut config = test_config();
    config.rate_limit = RateLimitConfig {
        message_max: 1,
        ..RateLimitConfig::default()
    };
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    alice.send(send_message(room, "first")).await.unwrap();
    alice.expect("new_message").await.unwrap();
    alice.send(send_message(room, "second")).await.unwrap();
    let error = alice.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_edit_and_delete() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();
    let mut bob = server.connect(&server.seed.bob).await.unwrap();
    alice.expect("user_online").await.unwrap();

    alice.send(send_message(room, "draft")).await.unwrap();
    let id = message_id(&alice.expect("new_message").await.unwrap());
    bob.expect("new_message").await.unwrap();

    // Only the sender may edit
    bob.send(edit_message(&id, "hijacked")).await.unwrap();
    let error = bob.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "NOT_MESSAGE_SENDER");
    alice.expect_silence(QUIET).await.unwrap();

    alice.send(edit_message(&id, "final")).await.unwrap();
    for client in [&mut alice, &mut bob] {
        let event = client.expect("message_updated").await.unwrap();
        let message = &event["data"]["message"];
        assert_eq!(message["content"], "final");
        assert_eq!(message["edited"], true);
        assert!(message["editedAt"].is_string());
    }

    alice.send(delete_message(&id)).await.unwrap();
    let event = bob.expect("message_updated").await.unwrap();
    assert_eq!(event["data"]["message"]["status"], "deleted");
    assert_eq!(event["data"]["message"]["messageType"], "deleted");

    alice.wait_for("message_updated").await.unwrap();
    alice.send(edit_message(&id, "resurrect")).await.unwrap();
    let error = alice.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "MESSAGE_DELETED");
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_reaction_replaces_previous() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();
    let mut bob = server.connect(&server.seed.bob).await.unwrap();
    alice.expect("user_online").await.unwrap();

    alice.send(send_message(room, "react to me")).await.unwrap();
    let id = message_id(&alice.expect("new_message").await.unwrap());
    bob.expect("new_message").await.unwrap();

    bob.send(add_reaction(&id, "👍")).await.unwrap();
    alice.expect("reaction_updated").await.unwrap();
    bob.send(add_reaction(&id, "❤️")).await.unwrap();

    let event = alice.expect("reaction_updated").await.unwrap();
    assert_eq!(event["data"]["messageId"], id);
    let reactions = event["data"]["reactions"].as_array().unwrap();
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0]["userId"], server.seed.bob.id.to_string());
    assert_eq!(reactions[0]["emoji"], "❤️");

    bob.send(remove_reaction(&id)).await.unwrap();
    let event = alice.expect("reaction_updated").await.unwrap();
    assert_eq!(event["data"]["reactions"], json!([]));
}

#[tokio::test]
async fn test_reaction_on_unknown_message() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    alice.send(add_reaction(&unknown_message(), "👍")).await.unwrap();
    let error = alice.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "UNKNOWN_MESSAGE");
}

// ============================================================================
// Rooms
// ============================================================================

#[tokio::test]
async fn test_join_room_sends_history() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    for content in ["one", "two", "three"] {
        alice.send(send_message(room, content)).await.unwrap();
        alice.expect("new_message").await.unwrap();
    }

    let mut bob = server.connect(&server.seed.bob).await.unwrap();
    bob.send(join_room(room)).await.unwrap();
    let event = bob.expect("room_messages").await.unwrap();
    let contents: Vec<_> = event["data"]["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents, vec!["one", "two", "three"]);

    // History goes to the requester only
    alice.expect("user_online").await.unwrap();
    alice.expect_silence(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_typing_and_leave() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();
    let mut bob = server.connect(&server.seed.bob).await.unwrap();
    alice.expect("user_online").await.unwrap();

    alice.send(typing(room, true)).await.unwrap();
    let event = bob.expect("user_typing").await.unwrap();
    assert_eq!(event["data"]["userName"], "alice");
    assert_eq!(event["data"]["isTyping"], true);
    alice.expect_silence(QUIET).await.unwrap();

    // After leaving, bob no longer hears the room
    bob.send(leave_room(room)).await.unwrap();
    bob.expect_silence(QUIET).await.unwrap();
    alice.send(send_message(room, "anyone?")).await.unwrap();
    alice.expect("new_message").await.unwrap();
    bob.expect_silence(QUIET).await.unwrap();
}

// ============================================================================
// Protocol errors
// ============================================================================

#[tokio::test]
async fn test_invalid_payload_keeps_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let room = server.seed.general;
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    alice.send(json!({ "event": "shout", "data": {} })).await.unwrap();
    let error = alice.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "INVALID_PAYLOAD");

    alice.send(json!({ "event": "send_message", "data": { "roomId": room } })).await.unwrap();
    let error = alice.expect("error").await.unwrap();
    assert_eq!(error["data"]["code"], "INVALID_PAYLOAD");

    alice.send(send_message(room, "still here")).await.unwrap();
    alice.expect("new_message").await.unwrap();
}

#[tokio::test]
async fn test_binary_frame_closes_with_decode_error() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut alice = server.connect(&server.seed.alice).await.unwrap();

    alice.send_binary(vec![1, 2, 3]).await.unwrap();
    let frame = alice.closed().await.unwrap().expect("close frame");
    assert_eq!(u16::from(frame.code), 4002);
}
