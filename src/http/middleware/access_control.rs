//! Access control hooks.
//!
//! Both hooks currently admit every request. They sit on each proxied route
//! so a real identity check can be dropped in without touching routing.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::request::RequestIdExt;
use crate::routing::ServiceKind;

/// Establish who is calling.
pub async fn authenticate(request: Request, next: Next) -> Response {
    tracing::debug!(
        request_id = request.request_id().map(|id| id.as_str()).unwrap_or("-"),
        path = %request.uri().path(),
        "Authenticated (pass-through)"
    );
    next.run(request).await
}

/// Check the caller may use `service`.
pub async fn authorize(
    State(service): State<ServiceKind>,
    request: Request,
    next: Next,
) -> Response {
    tracing::debug!(
        request_id = request.request_id().map(|id| id.as_str()).unwrap_or("-"),
        service = %service,
        "Authorized (pass-through)"
    );
    next.run(request).await
}
