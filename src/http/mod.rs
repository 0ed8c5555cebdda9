//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one handler per route)
//!     → request.rs (request ID)
//!     → middleware/ (authenticate, authorize per service)
//!     → dispatch (cache, breaker, admission, balancer, backend)
//!     → response.rs (mirror backend response or error envelope)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use response::ErrorBody;
pub use server::{AppState, HttpServer};
