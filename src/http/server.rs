//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one handler per gateway route
//! - Wire up middleware (tracing, request timeout, request ID, access hooks)
//! - Bind server to listener and drain on shutdown
//! - Hand each request to the dispatcher

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter, MethodRouter},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::dispatch::{BackendRequest, DispatchError, Dispatcher};
use crate::http::middleware::{authenticate, authorize};
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::http::response::ErrorBody;
use crate::observability::metrics;
use crate::resilience::BreakerState;
use crate::routing::{Route, ServiceKind};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_bytes: usize,
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher,
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut by_template: BTreeMap<&'static str, (ServiceKind, MethodRouter<AppState>)> =
            BTreeMap::new();
        for route in Route::ALL {
            let handler = move |State(state): State<AppState>, request: Request| {
                proxy(state, route, request)
            };
            let filter = method_filter(&route.method());
            let methods = match by_template.remove(route.template()) {
                Some((_, methods)) => methods.on(filter, handler),
                None => on(filter, handler),
            };
            by_template.insert(route.template(), (route.service(), methods));
        }

        let mut router = Router::new().route("/status", get(status));
        for (template, (service, methods)) in by_template {
            let methods = methods
                .route_layer(middleware::from_fn_with_state(service, authorize))
                .route_layer(middleware::from_fn(authenticate));
            router = router.route(template, methods);
        }

        router
            .fallback(not_found)
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(middleware::map_response(timeout_envelope))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

fn method_filter(method: &Method) -> MethodFilter {
    match *method {
        Method::GET => MethodFilter::GET,
        Method::PUT => MethodFilter::PUT,
        Method::DELETE => MethodFilter::DELETE,
        Method::PATCH => MethodFilter::PATCH,
        _ => MethodFilter::POST,
    }
}

/// Marks responses produced by `proxy`, so a backend's own 504 is left alone.
#[derive(Debug, Clone, Copy)]
struct Proxied;

/// Give the empty response of an elapsed request deadline the error envelope.
async fn timeout_envelope(response: Response) -> Response {
    if response.status() != StatusCode::GATEWAY_TIMEOUT
        || response.extensions().get::<Proxied>().is_some()
    {
        return response;
    }
    let body = ErrorBody {
        error: "request timed out".to_string(),
    };
    (StatusCode::GATEWAY_TIMEOUT, Json(body)).into_response()
}

/// Forward one request for `route` through the dispatcher.
async fn proxy(state: AppState, route: Route, request: Request) -> Response {
    let start = Instant::now();
    let request_id = request
        .request_id()
        .map(|id| id.to_string())
        .unwrap_or_default();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        route = route.name(),
        service = %route.service(),
    );

    async move {
        let (parts, body) = request.into_parts();
        let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "Failed reading request body");
                return DispatchError::RequestBuild(err.to_string()).into_response();
            }
        };

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let outbound = BackendRequest {
            method: parts.method,
            path_and_query,
            headers: parts.headers,
            body,
        };

        let mut response = match state.dispatcher.dispatch(route, &outbound).await {
            Ok(response) => response.into_response(),
            Err(err) => err.into_response(),
        };
        response.extensions_mut().insert(Proxied);
        metrics::record_latency(route, response.status().as_u16(), start);
        tracing::info!(status = response.status().as_u16(), elapsed = ?start.elapsed(), "Request complete");
        response
    }
    .instrument(span)
    .await
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    in_flight: usize,
    breakers: BTreeMap<&'static str, BreakerState>,
}

async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    let dispatcher = &state.dispatcher;
    let breakers = dispatcher
        .breakers()
        .iter()
        .map(|breaker| (breaker.service().registry_name(), breaker.state()))
        .collect();
    Json(StatusBody {
        status: "OK",
        in_flight: dispatcher.admission().in_flight(),
        breakers,
    })
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "no such route".to_string(),
        }),
    )
}
