//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → service identified
//!     → registry snapshot (non-empty instance list)
//!     → routes.rs (cursor for this route)
//!     → round_robin.rs (cursor % len, cursor += 1)
//!     → ServiceInstance to call
//! ```
//!
//! # Design Decisions
//! - One cursor per route, not per service
//! - Cursor advance is a single atomic fetch-and-add
//! - Selection never blocks; an empty snapshot is the registry's signal

pub mod round_robin;
pub mod routes;

use crate::registry::ServiceInstance;

pub use round_robin::RoundRobin;
pub use routes::RouteBalancer;

/// Strategy for choosing one instance out of a snapshot.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Returns `None` only for an empty slice.
    fn next_instance<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance>;
}
