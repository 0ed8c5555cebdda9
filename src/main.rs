//! API Gateway
//!
//! Single entry point for the account and template services.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                     API GATEWAY                       │
//!                         │                                                       │
//!   Client Request        │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   ──────────────────────┼─▶│  http   │──▶│ routing  │──▶│    dispatch      │   │
//!                         │  │ server  │   │ (Route)  │   │ cache → breaker  │   │
//!                         │  └─────────┘   └──────────┘   │ → admission → lb │   │
//!                         │                               └────────┬─────────┘   │
//!                         │                                        │             │
//!   Client Response       │  ┌─────────┐                  ┌────────▼─────────┐   │
//!   ◀─────────────────────┼──│response │◀─────────────────│  backend client  │◀──┼── Account /
//!                         │  └─────────┘                  └──────────────────┘   │   Template
//!                         │                                                       │   instances
//!                         │  registry (populated once at startup from inventory)  │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use api_gateway::config::{load_config, validation::validate_config, ConfigError};
use api_gateway::lifecycle::{bootstrap, start_metrics, wait_for_signal, Shutdown};
use api_gateway::observability::init_logging;
use api_gateway::{GatewayConfig, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "api-gateway", version, about = "HTTP gateway for the account and template services")]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `inventory.url`.
    #[arg(long)]
    inventory_url: Option<String>,
}

fn load(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(url) = &cli.inventory_url {
        config.inventory.url = url.clone();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        inventory = %config.inventory.url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if let Err(err) = start_metrics(&config) {
        tracing::error!(error = %err, "Metrics exporter disabled");
    }

    let dispatcher = bootstrap(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, dispatcher);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
