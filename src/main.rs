//! Account aggregation gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────────────────┐
//!                 │                     ACCOUNT GATEWAY                        │
//!   Client        │  ┌──────┐   ┌────────────┐   ┌───────┐   ┌──────────────┐  │
//!   ─────────────▶│─▶│ http │──▶│ aggregator │──▶│ cache │──▶│ retry        │  │
//!                 │  └──────┘   │ (fan-out)  │   └───────┘   │  → breaker   │  │
//!                 │             └────────────┘               │  → timeout   │  │
//!                 │                                          │  → fault     │  │
//!                 │                                          │  → adapter ──┼──┼──▶ Backend
//!                 │                                          │  → mapping   │  │
//!                 │                                          └──────────────┘  │
//!                 │  ┌────────────────────────────────────────────────────┐    │
//!                 │  │ config · observability · lifecycle · admin         │    │
//!                 │  └────────────────────────────────────────────────────┘    │
//!                 └────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use account_gateway::config::loader::load_or_default;
use account_gateway::lifecycle::signals::spawn_signal_listener;
use account_gateway::observability::{logging, metrics};
use account_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "account-gateway")]
#[command(about = "Canonical account API over heterogeneous backends", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "account-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        cache_ttl_secs = config.cache.ttl_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let metrics_handle = if config.observability.metrics_enabled {
        metrics::init_metrics()
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = GatewayServer::new(config, metrics_handle)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
