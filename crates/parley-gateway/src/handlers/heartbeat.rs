//! Heartbeat monitor
//!
//! Pings the client on a fixed interval and gives up on connections that
//! stop answering.

use crate::connection::Connection;
use crate::protocol::CloseCode;
use parley_common::ConnectionConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Ping schedule for one connection
#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    interval: Duration,
    timeout: Duration,
}

impl Heartbeat {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.heartbeat_interval(), config.heartbeat_timeout())
    }

    /// Run until the connection misses its pong deadline.
    ///
    /// Returns the close code to send; callers abort this task when the
    /// connection ends for any other reason.
    pub async fn run(self, connection: Arc<Connection>) -> CloseCode {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let since = connection.time_since_pong();
            if since > self.timeout {
                tracing::warn!(
                    connection_id = %connection.id(),
                    since_pong_ms = since.as_millis(),
                    "Connection timed out (no pong)"
                );
                return CloseCode::SessionTimeout;
            }

            if !connection.ping() {
                tracing::trace!(connection_id = %connection.id(), "Ping not queued");
            }
        }
    }
}
