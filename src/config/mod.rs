//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → read once by lifecycle::startup to build subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the registry is static after startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdmissionConfig, CacheConfig, CircuitBreakerConfig, GatewayConfig, InventoryConfig,
    ListenerConfig, ObservabilityConfig, RetryConfig, TimeoutConfig,
};
