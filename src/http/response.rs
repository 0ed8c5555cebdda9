//! Response shaping.
//!
//! # Responsibilities
//! - Mirror a backend response: status, content-type and body bytes
//! - Render gateway failures as `{"error": <message>}` with their status

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::dispatch::{BackendResponse, DispatchError};

/// Body of every gateway-originated error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        match self.content_type {
            Some(content_type) => {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            None => {
                response.headers_mut().remove(CONTENT_TYPE);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ServiceKind;
    use axum::http::{HeaderValue, StatusCode};

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn backend_response_is_mirrored() {
        let backend = BackendResponse {
            status: StatusCode::CREATED,
            content_type: Some(HeaderValue::from_static("text/plain")),
            body: "hello".into(),
        };
        let response = backend.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body_bytes(response).await, b"hello");
    }

    #[tokio::test]
    async fn missing_content_type_stays_missing() {
        let response = BackendResponse::new(StatusCode::OK, "raw").into_response();
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn errors_use_json_envelope() {
        let response = DispatchError::CircuitOpen {
            service: ServiceKind::Template,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: ErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.error, "service unavailable: circuit open for template_service");
    }
}
