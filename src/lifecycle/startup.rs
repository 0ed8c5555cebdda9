//! Startup orchestration.
//!
//! # Responsibilities
//! - Populate the service registry from the inventory source
//! - Build the dispatcher (cache ring, breakers, admission pool, client)
//! - Start the metrics exporter when enabled
//!
//! # Design Decisions
//! - Fail fast: an unreachable or empty inventory is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::dispatch::{BackendClient, Dispatcher, HyperBackend};
use crate::observability::init_metrics;
use crate::registry::{
    populate, HttpInventory, InventoryError, InventorySource, ServiceRegistry, StaticInventory,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("service registry could not be populated: {0}")]
    Inventory(#[from] InventoryError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("metrics exporter failed to start: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Build a ready-to-serve dispatcher from validated configuration.
pub async fn bootstrap(config: &GatewayConfig) -> Result<Arc<Dispatcher>, StartupError> {
    let registry = Arc::new(ServiceRegistry::new());
    if config.inventory.services.is_empty() {
        let source = HttpInventory::new(
            &config.inventory.url,
            Duration::from_secs(config.inventory.timeout_secs),
        )?;
        populate(&registry, &source).await?;
    } else {
        tracing::info!("Using statically configured services");
        populate(&registry, &StaticInventory::new(config.inventory.services.clone())).await?;
    }

    let backend: Arc<dyn BackendClient> =
        Arc::new(HyperBackend::new(config.listener.max_response_bytes));
    Ok(build_dispatcher(config, registry, backend))
}

/// Populate from an arbitrary source and wire a dispatcher around `backend`.
pub async fn bootstrap_with<S: InventorySource>(
    config: &GatewayConfig,
    source: &S,
    backend: Arc<dyn BackendClient>,
) -> Result<Arc<Dispatcher>, StartupError> {
    let registry = Arc::new(ServiceRegistry::new());
    populate(&registry, source).await?;
    Ok(build_dispatcher(config, registry, backend))
}

fn build_dispatcher(
    config: &GatewayConfig,
    registry: Arc<ServiceRegistry>,
    backend: Arc<dyn BackendClient>,
) -> Arc<Dispatcher> {
    let dispatcher = Dispatcher::new(config, registry, backend);
    tracing::info!(
        max_in_flight = config.admission.max_in_flight,
        cache_enabled = config.cache.enabled,
        cache_shards = ?dispatcher.cache().shard_ids(),
        max_attempts = config.retries.max_attempts,
        "Dispatcher ready"
    );
    Arc::new(dispatcher)
}

/// Start the Prometheus exporter if configured.
pub fn start_metrics(config: &GatewayConfig) -> Result<(), StartupError> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }
    let addr = config
        .observability
        .metrics_address
        .parse()
        .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
    init_metrics(addr)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ServiceInstance;

    #[tokio::test]
    async fn static_services_skip_discovery() {
        let mut config = GatewayConfig::default();
        config.inventory.url = "http://127.0.0.1:1".into();
        config.inventory.services = vec![
            ServiceInstance::new("account_service", "127.0.0.1", 5000),
            ServiceInstance::new("template_service", "127.0.0.1", 5005),
        ];

        let dispatcher = bootstrap(&config).await.unwrap();
        assert_eq!(dispatcher.registry().service_count(), 2);
        assert_eq!(dispatcher.cache().shard_ids().len(), 3);
    }

    #[tokio::test]
    async fn unreachable_inventory_is_fatal() {
        let mut config = GatewayConfig::default();
        config.inventory.url = "http://127.0.0.1:1".into();
        config.inventory.timeout_secs = 1;

        let err = bootstrap(&config).await.unwrap_err();
        assert!(matches!(err, StartupError::Inventory(InventoryError::Unreachable(_))));
    }

    #[tokio::test]
    async fn empty_source_is_fatal() {
        let config = GatewayConfig::default();
        let backend: Arc<dyn BackendClient> = Arc::new(HyperBackend::new(1024));
        let err = bootstrap_with(&config, &StaticInventory::new(Vec::new()), backend)
            .await
            .unwrap_err();
        assert!(matches!(err, StartupError::Inventory(InventoryError::Empty)));
    }

    #[test]
    fn disabled_metrics_is_a_no_op() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "garbage".into();
        assert!(start_metrics(&config).is_ok());
    }
}
