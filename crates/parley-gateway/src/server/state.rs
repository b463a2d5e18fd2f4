//! Gateway state
//!
//! Application state for the gateway server.

use crate::connection::ConnectionManager;
use parley_common::{AppConfig, JwtService};
use parley_service::ServiceContext;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Service context with stores, rate limiter and presence
    service_context: Arc<ServiceContext>,
    /// Registry of live WebSocket connections; also the services' transport
    connection_manager: Arc<ConnectionManager>,
    /// Verifies handshake tokens
    jwt_service: Arc<JwtService>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        service_context: ServiceContext,
        connection_manager: Arc<ConnectionManager>,
        jwt_service: Arc<JwtService>,
        config: AppConfig,
    ) -> Self {
        Self {
            service_context: Arc::new(service_context),
            connection_manager,
            jwt_service,
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.connection_manager
    }

    /// Get the token verifier
    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("config", &"AppConfig")
            .finish()
    }
}
