//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound every backend attempt with a deadline
//! - Cancel the attempt cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - An elapsed deadline is a transport failure like any other, so it
//!   counts toward retries and the circuit breaker

use std::future::Future;
use std::time::Duration;

use crate::dispatch::{BackendError, TransportError};

/// Run `fut`, giving up after `deadline`.
///
/// The inner future is dropped on expiry, which closes its connection.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline).into()),
    }
}
