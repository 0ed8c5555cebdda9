//! Request dispatch.
//!
//! Drives one inbound request through cache, registry, breaker, admission,
//! load balancer and backend, retrying transport failures.

use axum::http::Method;
use serde::de::IgnoredAny;
use std::sync::Arc;
use std::time::Duration;

use super::{BackendClient, BackendError, BackendRequest, BackendResponse, DispatchError};
use crate::cache::{CacheKey, CacheRing};
use crate::config::GatewayConfig;
use crate::load_balancer::RouteBalancer;
use crate::observability::{metrics, GatewayMetrics};
use crate::registry::{ServiceInstance, ServiceRegistry};
use crate::resilience::{
    with_deadline, AdmissionController, CircuitBreakers, RetryPolicy,
};
use crate::routing::Route;

/// Shared dispatch engine. One per gateway process.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    backend: Arc<dyn BackendClient>,
    balancer: RouteBalancer,
    breakers: CircuitBreakers,
    admission: Arc<AdmissionController>,
    cache: CacheRing<BackendResponse>,
    metrics: GatewayMetrics,
    retry: RetryPolicy,
    backend_timeout: Duration,
    cache_ttl: Duration,
}

impl Dispatcher {
    pub fn new(
        config: &GatewayConfig,
        registry: Arc<ServiceRegistry>,
        backend: Arc<dyn BackendClient>,
    ) -> Self {
        let cache = if config.cache.enabled {
            CacheRing::with_memory_shards(&config.cache.shards, config.cache.virtual_nodes)
        } else {
            CacheRing::new(config.cache.virtual_nodes)
        };

        Self {
            registry,
            backend,
            balancer: RouteBalancer::round_robin(),
            breakers: CircuitBreakers::new(&config.circuit_breaker),
            admission: Arc::new(AdmissionController::new(config.admission.max_in_flight)),
            cache,
            metrics: GatewayMetrics::new(),
            retry: RetryPolicy::from_config(&config.retries),
            backend_timeout: config.timeouts.backend(),
            cache_ttl: config.cache.ttl(),
        }
    }

    /// Answer `request` for `route`, from cache or from a backend instance.
    pub async fn dispatch(
        &self,
        route: Route,
        request: &BackendRequest,
    ) -> Result<BackendResponse, DispatchError> {
        let method = route.method();
        self.metrics.record_request(&method);

        // HEAD shares the GET handlers but its empty answers must not be cached.
        let cache_key = (route.is_cacheable() && request.method == method)
            .then(|| CacheKey::for_request(route, &request.path_and_query));
        if let Some(key) = &cache_key {
            let cached = self.cache.get(key);
            metrics::record_cache_lookup(cached.is_some());
            if let Some(response) = cached {
                tracing::debug!(route = route.name(), key = %key, "Served from cache");
                return Ok(response);
            }
        }

        let result = self.forward(route, request, cache_key).await;
        if let Err(err) = &result {
            self.metrics.record_error(&method);
            tracing::warn!(
                route = route.name(),
                kind = err.kind(),
                error = %err,
                "Request failed"
            );
        }
        result
    }

    async fn forward(
        &self,
        route: Route,
        request: &BackendRequest,
        cache_key: Option<CacheKey>,
    ) -> Result<BackendResponse, DispatchError> {
        let service = route.service();
        let Some(snapshot) = self.registry.list(service.registry_name()) else {
            return Err(DispatchError::NoInstances { service });
        };
        let breaker = self.breakers.for_service(service);

        let mut attempt = 0;
        loop {
            attempt += 1;

            if !breaker.allow() {
                metrics::record_circuit_rejection(service);
                return Err(DispatchError::CircuitOpen { service });
            }

            let Some(slot) = self.admission.try_acquire() else {
                breaker.release_probe();
                return Err(DispatchError::AdmissionRejected);
            };
            metrics::record_in_flight(self.admission.in_flight());

            let Some(instance) = self.balancer.select(route, &snapshot) else {
                breaker.release_probe();
                return Err(DispatchError::NoInstances { service });
            };

            tracing::debug!(route = route.name(), attempt, instance = %instance, "Forwarding");
            let outcome = with_deadline(self.backend_timeout, self.backend.send(&instance, request)).await;
            slot.release();

            match outcome {
                Ok(response) => {
                    breaker.record_success();
                    return self.finish(route, &request.method, &instance, cache_key, response);
                }
                Err(BackendError::Build(reason)) => {
                    breaker.release_probe();
                    return Err(DispatchError::RequestBuild(reason));
                }
                Err(BackendError::ResponseTooLarge(limit)) => {
                    breaker.record_success();
                    return Err(DispatchError::ResponseTooLarge { service, limit });
                }
                Err(BackendError::Transport(source)) => {
                    breaker.record_failure();
                    self.metrics.record_error(&route.method());
                    tracing::warn!(
                        route = route.name(),
                        attempt,
                        instance = %instance,
                        error = %source,
                        "Backend attempt failed"
                    );

                    if !self.retry.has_attempts_left(attempt) {
                        return Err(DispatchError::Upstream {
                            service,
                            attempts: attempt,
                            source,
                        });
                    }
                    let delay = self.retry.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    fn finish(
        &self,
        route: Route,
        method: &Method,
        instance: &ServiceInstance,
        cache_key: Option<CacheKey>,
        response: BackendResponse,
    ) -> Result<BackendResponse, DispatchError> {
        let service = route.service();
        if service.expects_json() && *method != Method::HEAD {
            if let Err(source) = serde_json::from_slice::<IgnoredAny>(&response.body) {
                return Err(DispatchError::Serialization { service, source });
            }
        }

        if let Some(key) = cache_key {
            if response.status.is_success() {
                self.cache.put(key, response.clone(), self.cache_ttl);
            }
        }

        tracing::debug!(
            route = route.name(),
            instance = %instance,
            status = response.status.as_u16(),
            "Backend answered"
        );
        Ok(response)
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn breakers(&self) -> &CircuitBreakers {
        &self.breakers
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn cache(&self) -> &CacheRing<BackendResponse> {
        &self.cache
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }
}
