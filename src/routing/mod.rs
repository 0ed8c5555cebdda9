//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → axum router (one handler per Route)
//!     → router.rs (Route → service, method, cacheability)
//!     → matcher.rs (path → resource id for cache keys)
//!     → dispatch
//! ```
//!
//! # Design Decisions
//! - Routes are a closed set, compiled into the binary
//! - Deterministic: same input always matches same route
//! - Service names are an enum, not free-form strings

pub mod matcher;
pub mod router;

pub use router::{Route, ServiceKind};
