//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacity > 0)
//! - Check addresses and URLs parse
//! - Detect duplicate cache shard ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid inventory url: {0}")]
    InvalidInventoryUrl(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("retries.base_delay_ms ({base}) exceeds retries.max_delay_ms ({max})")]
    BackoffRange { base: u64, max: u64 },

    #[error("cache shard id must not be empty")]
    EmptyShardId,

    #[error("duplicate cache shard id: {0}")]
    DuplicateShard(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }
    if config.listener.max_response_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_response_bytes"));
    }

    if config.inventory.services.is_empty() {
        match url::Url::parse(&config.inventory.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => errors.push(ValidationError::InvalidInventoryUrl(config.inventory.url.clone())),
        }
    }
    if config.inventory.timeout_secs == 0 {
        errors.push(ValidationError::Zero("inventory.timeout_secs"));
    }

    if config.timeouts.backend_ms == 0 {
        errors.push(ValidationError::Zero("timeouts.backend_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero("retries.max_attempts"));
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::BackoffRange {
            base: config.retries.base_delay_ms,
            max: config.retries.max_delay_ms,
        });
    }

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.failure_threshold"));
    }
    if config.circuit_breaker.cooldown_ms == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.cooldown_ms"));
    }
    if config.circuit_breaker.failure_window_ms == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.failure_window_ms"));
    }

    if config.admission.max_in_flight == 0 {
        errors.push(ValidationError::Zero("admission.max_in_flight"));
    }

    if config.cache.enabled {
        if config.cache.ttl_ms == 0 {
            errors.push(ValidationError::Zero("cache.ttl_ms"));
        }
        if config.cache.virtual_nodes == 0 {
            errors.push(ValidationError::Zero("cache.virtual_nodes"));
        }
        let mut seen = HashSet::new();
        for shard in &config.cache.shards {
            if shard.is_empty() {
                errors.push(ValidationError::EmptyShardId);
            } else if !seen.insert(shard.as_str()) {
                errors.push(ValidationError::DuplicateShard(shard.clone()));
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
