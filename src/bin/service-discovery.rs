//! Minimal service discovery server.
//!
//! Serves the inventory the gateway reads once at startup:
//! - `GET /status`   → `{"status":"OK"}`
//! - `GET /services` → `[{"name", "host", "port"}, ...]`

use axum::{extract::State, routing::get, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

use api_gateway::config::ObservabilityConfig;
use api_gateway::lifecycle::wait_for_signal;
use api_gateway::observability::init_logging;
use api_gateway::registry::{ServiceInstance, ServiceRegistry};

#[derive(Parser, Debug)]
#[command(name = "service-discovery", about = "Static service inventory for the API gateway")]
struct Cli {
    #[arg(short, long, default_value = "0.0.0.0:8082")]
    bind: String,

    /// Register an instance as `name=host:port`. Repeatable.
    #[arg(short, long = "service", value_parser = parse_service)]
    services: Vec<ServiceInstance>,
}

fn parse_service(raw: &str) -> Result<ServiceInstance, String> {
    let (name, address) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=host:port, got '{raw}'"))?;
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("missing port in '{address}'"))?;
    let port: u16 = port.parse().map_err(|_| format!("invalid port '{port}'"))?;
    if name.is_empty() || host.is_empty() {
        return Err(format!("empty name or host in '{raw}'"));
    }
    Ok(ServiceInstance::new(name, host, port))
}

fn default_services() -> Vec<ServiceInstance> {
    vec![
        ServiceInstance::new("account_service", "accounts_service", 5000),
        ServiceInstance::new("template_service", "template_service", 5005),
    ]
}

async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

async fn services(State(registry): State<Arc<ServiceRegistry>>) -> Json<Vec<ServiceInstance>> {
    Json(registry.all())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&ObservabilityConfig::default());
    let cli = Cli::parse();

    let registry = Arc::new(ServiceRegistry::new());
    let records = if cli.services.is_empty() {
        default_services()
    } else {
        cli.services
    };
    for record in records {
        tracing::info!(service = %record, "Registered");
        registry.register_instance(record);
    }

    let app = Router::new()
        .route("/status", get(status))
        .route("/services", get(services))
        .with_state(registry);

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Service discovery listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;
    Ok(())
}
