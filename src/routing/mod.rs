//! Route table.
//!
//! # Data Flow
//! ```text
//! (method, path)
//!     → category router (echo, status, redirect, cookies, auth, digest,
//!       cache, encoding, timing, streaming, range, content)
//!     → handler
//!     → fallback: 404 JSON error
//! ```
//!
//! # Design Decisions
//! - Table is built once at startup and is immutable afterwards
//! - Most specific pattern wins (static segments beat captures)
//! - Argument-bearing routes have no bare form: `/status` and `/status/`
//!   fall through to not-found, never to a trailing-slash redirect

use axum::Router;

use crate::error::HttpBinError;
use crate::handlers;
use crate::http::AppState;

/// Build the complete route table with `state` applied.
pub fn route_table(state: AppState) -> Router {
    Router::new()
        .merge(handlers::content::routes())
        .merge(handlers::echo::routes())
        .merge(handlers::status::routes())
        .merge(handlers::redirect::routes())
        .merge(handlers::cookies::routes())
        .merge(handlers::auth::routes())
        .merge(handlers::digest::routes())
        .merge(handlers::cache::routes())
        .merge(handlers::encoding::routes())
        .merge(handlers::timing::routes())
        .merge(handlers::streaming::routes())
        .merge(handlers::range::routes())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> HttpBinError {
    HttpBinError::NotFound
}
