//! Request gatekeeper.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────────┐
//!                      │                     GATEKEEPER                        │
//!                      │                                                       │
//!   Client Request     │  ┌──────────┐   ┌────────────┐   ┌───────────────┐    │
//!   ───────────────────┼─▶│   rate   │──▶│ authenti-  │──▶│ authorization │──┐ │
//!                      │  │  limit   │   │  cation    │   │  (role→caps)  │  │ │
//!                      │  └────┬─────┘   └─────┬──────┘   └───────┬───────┘  │ │
//!                      │       │ 429           │ 401              │ 401/403  │ │
//!   Client Response    │       ▼               ▼                  ▼          ▼ │
//!   ◀──────────────────┼──────────────── error body ──────────────────  handler│
//!                      │                                                       │
//!                      │  config · observability · lifecycle                   │
//!                      └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gatekeeper::config::{load_config, GatekeeperConfig};
use gatekeeper::lifecycle::signals::shutdown_on_signal;
use gatekeeper::observability::{logging, metrics};
use gatekeeper::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Rate limiting, authentication and authorization gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GATEKEEPER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = GatekeeperConfig::default();
            gatekeeper::config::loader::apply_env_overrides(&mut config, |k| std::env::var(k).ok());
            config
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        testing = config.testing,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        rules = config.authorization.rules.len(),
        users = config.users.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
