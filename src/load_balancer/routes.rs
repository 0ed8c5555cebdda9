//! Per-route cursor management.
//!
//! # Responsibilities
//! - Hold one independent selector per logical route
//! - Select an instance from a registry snapshot for a route

use crate::load_balancer::{round_robin::RoundRobin, LoadBalancer};
use crate::registry::{ServiceInstance, Snapshot};
use crate::routing::Route;

/// One load balancer per route, indexed by `Route::index`.
#[derive(Debug)]
pub struct RouteBalancer {
    selectors: Vec<Box<dyn LoadBalancer>>,
}

impl RouteBalancer {
    /// Round-robin over every route.
    pub fn round_robin() -> Self {
        Self {
            selectors: Route::ALL
                .iter()
                .map(|_| Box::new(RoundRobin::new()) as Box<dyn LoadBalancer>)
                .collect(),
        }
    }

    /// Pick the next instance for `route` from `snapshot`.
    pub fn select(&self, route: Route, snapshot: &Snapshot) -> Option<ServiceInstance> {
        let selector = self.selectors.get(route.index())?;
        let instance = selector.next_instance(snapshot.instances()).cloned();
        if instance.is_none() {
            tracing::debug!(route = route.name(), "No instance selected");
        }
        instance
    }
}

impl Default for RouteBalancer {
    fn default() -> Self {
        Self::round_robin()
    }
}
