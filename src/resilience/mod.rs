//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Backend attempt:
//!     → circuit_breaker.rs (is the service allowed at all?)
//!     → admission.rs (take one of the global in-flight slots)
//!     → timeouts.rs (bound the call)
//!     → On transport failure: circuit_breaker.rs records it,
//!       retries.rs decides on another attempt after backoff
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - A slot covers one attempt, never a whole request with its retries
//! - Circuit breaker prevents cascading failures

pub mod admission;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use admission::{AdmissionController, AdmissionSlot};
pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakers};
pub use retries::{calculate_backoff, RetryPolicy};
pub use timeouts::with_deadline;
