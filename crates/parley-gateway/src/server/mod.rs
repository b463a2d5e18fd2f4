//! Gateway server setup
//!
//! Provides backend wiring, routes and the serve loop.

mod auth;
mod backend;
mod handler;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{authenticate, extract_token, GatewayQuery, HandshakeRejection};
pub use backend::{QuotaBackend, Repositories};
pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::connection::ConnectionManager;
use axum::{routing::get, Router};
use parley_common::{AppConfig, AppError, JwtService};
use parley_service::{PresenceTracker, ServiceContext};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assemble `GatewayState` from already connected backends
pub fn build_state(
    config: AppConfig,
    repos: Repositories,
    quota: &QuotaBackend,
) -> Result<GatewayState, AppError> {
    let connection_manager = ConnectionManager::new_shared();

    let service_context = ServiceContext::builder()
        .user_repo(repos.users)
        .room_repo(repos.rooms)
        .message_repo(repos.messages)
        .transport(connection_manager.clone())
        .quota_store(quota.store())
        .rate_limits(config.rate_limit.clone())
        .presence(PresenceTracker::new())
        .chat(config.chat.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
    ));

    Ok(GatewayState::new(
        service_context,
        connection_manager,
        jwt_service,
        config,
    ))
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let repos = Repositories::from_config(&config).await?;
    let quota = QuotaBackend::from_config(&config).await?;

    if quota
        .spawn_sweeper(Duration::from_secs(config.rate_limit.sweep_interval_secs.max(1)))
        .is_some()
    {
        tracing::debug!("Rate bucket sweeper started");
    }

    build_state(config, repos, &quota)
}

/// Serve the gateway on an already bound listener
pub async fn serve(listener: TcpListener, state: GatewayState) -> Result<(), AppError> {
    let manager = state.connection_manager().clone();
    let app = create_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(manager))
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

/// Resolve on Ctrl-C, asking every live connection to close
async fn shutdown_signal(manager: Arc<ConnectionManager>) {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
    let closed = manager.close_all();
    tracing::info!(closed, "Shutting down gateway");
}

/// Run the gateway server
pub async fn run_server(state: GatewayState, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    serve(listener, state).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(config).await?;

    run_server(state, addr).await
}

#[cfg(test)]
mod tests {
    use super::test_support::{test_config, TestGateway};
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let gw = TestGateway::new();
        let response = create_app(gw.state.clone())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gateway_rejects_missing_token() {
        let gw = TestGateway::new();
        let response = create_app(gw.state.clone())
            .oneshot(Request::get("/gateway").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_gateway_state_in_memory() {
        let state = create_gateway_state(test_config()).await.unwrap();
        assert_eq!(state.connection_manager().connection_count(), 0);
    }
}
