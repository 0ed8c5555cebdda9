//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::registry::ServiceInstance;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Where the service registry is populated from at startup.
    pub inventory: InventoryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Per-service circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Global admission control.
    pub admission: AdmissionConfig,

    /// Response cache ring.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest request body buffered for forwarding, in bytes.
    pub max_body_bytes: usize,

    /// Largest backend response body buffered, in bytes.
    pub max_response_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            max_response_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Inventory source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Base URL of the service discovery endpoint.
    pub url: String,

    /// Timeout for the single startup query, in seconds.
    pub timeout_secs: u64,

    /// Static service list. When non-empty it replaces the HTTP query.
    pub services: Vec<ServiceInstance>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8082".to_string(),
            timeout_secs: 5,
            services: Vec::new(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on a single backend attempt, in milliseconds.
    pub backend_ms: u64,

    /// Request timeout (whole inbound request incl. retries) in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn backend(&self) -> Duration {
        Duration::from_millis(self.backend_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            backend_ms: 5_000,
            request_secs: 30,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 50,
            max_delay_ms: 500,
        }
    }
}

/// Circuit breaker configuration, applied to every service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// How long an open circuit rejects calls before probing, in milliseconds.
    pub cooldown_ms: u64,

    /// Failures older than this are forgotten while closed, in milliseconds.
    pub failure_window_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn failure_window(&self) -> Duration {
        Duration::from_millis(self.failure_window_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_ms: 5_000,
            failure_window_ms: 14_000,
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Backend attempts allowed in flight across the whole gateway.
    pub max_in_flight: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self { max_in_flight: 10 }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching for read routes.
    pub enabled: bool,

    /// Entry lifetime in milliseconds.
    pub ttl_ms: u64,

    /// Shard identifiers placed on the ring.
    pub shards: Vec<String>,

    /// Virtual nodes per shard.
    pub virtual_nodes: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: 300_000, // 5 minutes
            shards: vec![
                "shard-0".to_string(),
                "shard-1".to_string(),
                "shard-2".to_string(),
            ],
            virtual_nodes: 64,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
