//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, middleware pipeline, graceful shutdown)
//!     → middleware/ (observer, body limit, preflight, auto-HEAD)
//!     → routing table → handlers
//!     → envelope.rs (request snapshot) → response.rs (encoders)
//!     → Send to client
//! ```

pub mod envelope;
pub mod middleware;
pub mod response;
pub mod server;

pub use envelope::{BodyEnvelope, MultiMap, RequestMeta};
pub use server::{AppState, HttpServer};
