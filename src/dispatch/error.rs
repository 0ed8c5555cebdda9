//! Terminal outcomes of a dispatch.

use axum::http::StatusCode;
use thiserror::Error;

use super::TransportError;
use crate::routing::ServiceKind;

/// Why a request could not be answered with a backend response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no instances registered for {service}")]
    NoInstances { service: ServiceKind },

    #[error("service unavailable: circuit open for {service}")]
    CircuitOpen { service: ServiceKind },

    #[error("too many concurrent requests")]
    AdmissionRejected,

    #[error("error sending request to {service} after {attempts} attempt(s): {source}")]
    Upstream {
        service: ServiceKind,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("error parsing response from {service}: {source}")]
    Serialization {
        service: ServiceKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {service} exceeds {limit} bytes")]
    ResponseTooLarge { service: ServiceKind, limit: usize },

    #[error("error creating request: {0}")]
    RequestBuild(String),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoInstances { .. } | Self::CircuitOpen { .. } | Self::AdmissionRejected => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Serialization { .. } | Self::ResponseTooLarge { .. } | Self::RequestBuild(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoInstances { .. } => "no_instances",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::AdmissionRejected => "admission_rejected",
            Self::Upstream { .. } => "upstream",
            Self::Serialization { .. } => "serialization",
            Self::ResponseTooLarge { .. } => "response_too_large",
            Self::RequestBuild(_) => "request_build",
        }
    }
}
