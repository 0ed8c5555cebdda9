//! Startup population from the service inventory.
//!
//! # Responsibilities
//! - Query the inventory source exactly once
//! - Append every returned record to the registry
//! - Fail fast when the source is unreachable or empty

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::registry::{ServiceInstance, ServiceRegistry};

/// Errors that prevent the registry from being populated.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("invalid inventory url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("inventory source unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("inventory response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("inventory source returned no services")]
    Empty,

    #[error("registry was already populated")]
    AlreadyPopulated,
}

/// Anything that can answer the single startup inventory query.
pub trait InventorySource {
    /// Ordered `{name, host, port}` records.
    fn fetch(&self) -> impl Future<Output = Result<Vec<ServiceInstance>, InventoryError>> + Send;
}

/// Queries `GET <base>/services` on a discovery service.
#[derive(Debug, Clone)]
pub struct HttpInventory {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpInventory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InventoryError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("services"))
            .map_err(|source| InventoryError::InvalidUrl {
                url: base_url.to_string(),
                source,
            })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InventoryError::Unreachable)?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl InventorySource for HttpInventory {
    async fn fetch(&self) -> Result<Vec<ServiceInstance>, InventoryError> {
        tracing::info!(endpoint = %self.endpoint, "Querying service inventory");
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(InventoryError::Unreachable)?;
        response
            .json::<Vec<ServiceInstance>>()
            .await
            .map_err(InventoryError::Decode)
    }
}

/// Serves a fixed list, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    services: Vec<ServiceInstance>,
}

impl StaticInventory {
    pub fn new(services: Vec<ServiceInstance>) -> Self {
        Self { services }
    }
}

impl InventorySource for StaticInventory {
    async fn fetch(&self) -> Result<Vec<ServiceInstance>, InventoryError> {
        Ok(self.services.clone())
    }
}

/// Drain `source` into an empty `registry`. Returns the number of instances registered.
pub async fn populate<S: InventorySource>(
    registry: &ServiceRegistry,
    source: &S,
) -> Result<usize, InventoryError> {
    if !registry.is_empty() {
        return Err(InventoryError::AlreadyPopulated);
    }

    let records = source.fetch().await?;
    if records.is_empty() {
        return Err(InventoryError::Empty);
    }

    let count = records.len();
    for record in records {
        registry.register_instance(record);
    }

    tracing::info!(
        instances = count,
        services = registry.service_count(),
        "Service registry populated"
    );
    Ok(count)
}
