//! Service registry storage.
//!
//! # Responsibilities
//! - Map service names to ordered instance lists
//! - Hand out immutable snapshots to concurrent readers
//! - Signal "no instances" explicitly instead of returning an empty list
//!
//! # Design Decisions
//! - Copy-on-write: `register` builds a new `Arc<[ServiceInstance]>`, so a
//!   snapshot taken earlier is never modified
//! - Writes only happen at startup; reads take a short read lock and clone an `Arc`

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};

use crate::registry::ServiceInstance;

/// Immutable, non-empty view of one service's instances.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<[ServiceInstance]>);

impl Snapshot {
    pub fn instances(&self) -> &[ServiceInstance] {
        &self.0
    }
}

impl Deref for Snapshot {
    type Target = [ServiceInstance];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Name → ordered instances.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<[ServiceInstance]>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance to `name`.
    pub fn register(&self, name: &str, host: &str, port: u16) {
        self.register_instance(ServiceInstance::new(name, host, port));
    }

    /// Append an already-built instance, keyed by its `name`.
    pub fn register_instance(&self, instance: ServiceInstance) {
        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
        let updated: Arc<[ServiceInstance]> = match services.get(&instance.name) {
            Some(existing) => existing
                .iter()
                .cloned()
                .chain(std::iter::once(instance.clone()))
                .collect(),
            None => Arc::from(vec![instance.clone()]),
        };
        tracing::debug!(
            service = %instance.name,
            instance = %instance,
            instances = updated.len(),
            "Registered service instance"
        );
        services.insert(instance.name, updated);
    }

    /// Snapshot of `name`'s instances, or `None` when it has none.
    pub fn list(&self, name: &str) -> Option<Snapshot> {
        let services = self.services.read().unwrap_or_else(PoisonError::into_inner);
        services
            .get(name)
            .filter(|instances| !instances.is_empty())
            .map(|instances| Snapshot(Arc::clone(instances)))
    }

    /// Every registered instance, grouped by service name in name order.
    pub fn all(&self) -> Vec<ServiceInstance> {
        let services = self.services.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = services.keys().collect();
        names.sort();
        names
            .into_iter()
            .flat_map(|name| services[name].iter().cloned())
            .collect()
    }

    /// Number of distinct service names.
    pub fn service_count(&self) -> usize {
        self.services.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.service_count() == 0
    }
}
