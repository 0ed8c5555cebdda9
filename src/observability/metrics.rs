//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count requests and errors per HTTP method
//! - Expose Prometheus-compatible metrics endpoint
//! - Record dispatch latency, cache and breaker outcomes
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method
//! - `gateway_errors_total` (counter): failed attempts and failed requests by method
//! - `gateway_request_duration_seconds` (histogram): latency by route and status
//! - `gateway_cache_lookups_total` (counter): hits and misses
//! - `gateway_circuit_rejections_total` (counter): fast-failed requests by service
//! - `gateway_in_flight` (gauge): admission slots held
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Per-method counters are also kept in-process so they can be read back

use axum::http::Method;
use dashmap::DashMap;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::routing::{Route, ServiceKind};

/// Install the global recorder and start the Prometheus scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Request and error counters keyed by HTTP method.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    requests: DashMap<String, AtomicU64>,
    errors: DashMap<String, AtomicU64>,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, method: &Method) {
        bump(&self.requests, method.as_str());
        counter!("gateway_requests_total", "method" => method.to_string()).increment(1);
    }

    pub fn record_error(&self, method: &Method) {
        bump(&self.errors, method.as_str());
        counter!("gateway_errors_total", "method" => method.to_string()).increment(1);
    }

    pub fn requests_total(&self, method: &Method) -> u64 {
        read(&self.requests, method.as_str())
    }

    pub fn errors_total(&self, method: &Method) -> u64 {
        read(&self.errors, method.as_str())
    }
}

fn bump(map: &DashMap<String, AtomicU64>, key: &str) {
    if let Some(counter) = map.get(key) {
        counter.fetch_add(1, Ordering::Relaxed);
        return;
    }
    map.entry(key.to_string())
        .or_default()
        .fetch_add(1, Ordering::Relaxed);
}

fn read(map: &DashMap<String, AtomicU64>, key: &str) -> u64 {
    map.get(key)
        .map(|counter| counter.load(Ordering::Relaxed))
        .unwrap_or(0)
}

pub fn record_latency(route: Route, status: u16, start: Instant) {
    histogram!(
        "gateway_request_duration_seconds",
        "route" => route.name(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("gateway_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_circuit_rejection(service: ServiceKind) {
    counter!("gateway_circuit_rejections_total", "service" => service.registry_name()).increment(1);
}

pub fn record_in_flight(count: usize) {
    gauge!("gateway_in_flight").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_per_method() {
        let metrics = GatewayMetrics::new();
        metrics.record_request(&Method::GET);
        metrics.record_request(&Method::GET);
        metrics.record_request(&Method::POST);
        metrics.record_error(&Method::POST);

        assert_eq!(metrics.requests_total(&Method::GET), 2);
        assert_eq!(metrics.requests_total(&Method::POST), 1);
        assert_eq!(metrics.errors_total(&Method::GET), 0);
        assert_eq!(metrics.errors_total(&Method::POST), 1);
        assert_eq!(metrics.requests_total(&Method::DELETE), 0);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let metrics = std::sync::Arc::new(GatewayMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_request(&Method::PUT);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.requests_total(&Method::PUT), 8000);
    }
}
