//! Endpoint handlers, one module per category.
//!
//! Each module exposes `routes()`, a `Router<AppState>` fragment merged
//! into the route table by `routing::route_table`.

pub mod auth;
pub mod cache;
pub mod content;
pub mod cookies;
pub mod digest;
pub mod echo;
pub mod encoding;
pub mod range;
pub mod redirect;
pub mod status;
pub mod streaming;
pub mod timing;
