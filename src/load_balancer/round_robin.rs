//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::LoadBalancer;
use crate::registry::ServiceInstance;

/// Round-robin selector.
/// Stores an internal cursor to rotate through instances.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_instance<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }

        // Read and advance in one step; the modulo is taken against the
        // length of the snapshot being served, so a resized list just wraps.
        let cursor = self.cursor.fetch_add(1, Ordering::Relaxed);
        instances.get(cursor % instances.len())
    }
}
