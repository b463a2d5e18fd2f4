//! Parley Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p parley-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use parley_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration first; it picks the log format
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        port = config.gateway.port,
        database = config.database.is_some(),
        redis = config.redis.is_some(),
        "Configuration loaded"
    );

    if let Err(e) = parley_gateway::run(config).await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}
