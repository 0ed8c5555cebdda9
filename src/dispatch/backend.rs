//! Backend transport.
//!
//! # Responsibilities
//! - Describe one outbound attempt (`BackendRequest`) and its buffered
//!   result (`BackendResponse`)
//! - Send an attempt to a concrete instance over HTTP/1.1
//! - Separate failures that are worth retrying (transport) from ones that
//!   are not (request construction, oversized responses)
//!
//! # Design Decisions
//! - Headers and body are forwarded as received
//! - Responses are buffered whole so they can be validated and cached
//! - Any response status is a successful transport outcome; only
//!   connect/IO/deadline failures are errors

use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::registry::ServiceInstance;

/// One attempt's worth of outbound request data.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    /// Path plus optional `?query`, exactly as received.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BackendRequest {
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// A fully buffered backend response. Also the value stored in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: body.into(),
        }
    }
}

/// A failed attempt that may succeed if repeated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("failed reading response body: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// The outbound request could not be assembled. Not retried.
    #[error("could not build backend request: {0}")]
    Build(String),

    /// The backend answered with more than the buffering limit. Not retried.
    #[error("backend response exceeds {0} bytes")]
    ResponseTooLarge(usize),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Anything that can carry a `BackendRequest` to an instance.
pub trait BackendClient: Send + Sync + fmt::Debug {
    fn send<'a>(
        &'a self,
        instance: &'a ServiceInstance,
        request: &'a BackendRequest,
    ) -> BoxFuture<'a, Result<BackendResponse, BackendError>>;
}

/// Pooled HTTP/1.1 client.
#[derive(Clone)]
pub struct HyperBackend {
    client: Client<HttpConnector, Body>,
    max_response_bytes: usize,
}

impl HyperBackend {
    pub fn new(max_response_bytes: usize) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            max_response_bytes,
        }
    }
}

impl fmt::Debug for HyperBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperBackend")
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

impl BackendClient for HyperBackend {
    fn send<'a>(
        &'a self,
        instance: &'a ServiceInstance,
        request: &'a BackendRequest,
    ) -> BoxFuture<'a, Result<BackendResponse, BackendError>> {
        Box::pin(async move {
            let url = instance
                .url_for(&request.path_and_query)
                .map_err(|e| BackendError::Build(e.to_string()))?;

            let mut builder = Request::builder()
                .method(request.method.clone())
                .uri(url.as_str());
            if let Some(headers) = builder.headers_mut() {
                for (name, value) in request.headers.iter() {
                    headers.append(name.clone(), value.clone());
                }
            }
            let outbound = builder
                .body(Body::from(request.body.clone()))
                .map_err(|e| BackendError::Build(e.to_string()))?;

            let response = self
                .client
                .request(outbound)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;

            let status = response.status();
            let content_type = response.headers().get(CONTENT_TYPE).cloned();
            let mut stream = Body::new(response.into_body()).into_data_stream();
            let mut body = Vec::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| TransportError::Body(e.to_string()))?;
                if body.len() + chunk.len() > self.max_response_bytes {
                    return Err(BackendError::ResponseTooLarge(self.max_response_bytes));
                }
                body.extend_from_slice(&chunk);
            }

            Ok(BackendResponse {
                status,
                content_type,
                body: Bytes::from(body),
            })
        })
    }
}
