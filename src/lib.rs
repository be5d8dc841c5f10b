//! HTTP request & response testing service.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::{HttpBinConfig, ServerConfig};
pub use error::HttpBinError;
pub use http::HttpServer;
pub use lifecycle::{Lifecycle, LifecycleState, Shutdown};
