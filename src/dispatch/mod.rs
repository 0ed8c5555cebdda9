//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! (Route, BackendRequest)
//!     → cache lookup (cacheable reads only)
//!     → registry snapshot for the route's service
//!     → per attempt: breaker.allow → admission slot → balancer.select
//!         → backend.send under deadline → release slot
//!     → success: validate, maybe cache, return
//!     → transport failure: record, back off, next attempt
//! ```
//!
//! # Design Decisions
//! - The transport sits behind `BackendClient` so the dispatcher can be
//!   exercised without sockets
//! - Every terminal failure maps to exactly one `DispatchError` variant and
//!   one HTTP status

pub mod backend;
pub mod dispatcher;
pub mod error;

pub use backend::{
    BackendClient, BackendError, BackendRequest, BackendResponse, HyperBackend, TransportError,
};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
