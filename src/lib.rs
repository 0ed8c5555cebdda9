//! API gateway library.
//!
//! Exposes one HTTP front end for the account and template services and
//! forwards each request to a backend instance chosen round-robin, behind a
//! circuit breaker, a global admission limit and a sharded response cache.

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod routing;

pub use config::GatewayConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
