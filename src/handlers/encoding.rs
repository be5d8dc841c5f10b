//! Compressed envelopes.

use axum::{
    response::Response,
    routing::{any, get},
    Router,
};
use serde::Serialize;

use crate::error::HttpBinError;
use crate::http::response::{compressed_json, ContentEncoding};
use crate::http::{AppState, RequestMeta};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gzip", get(gzip))
        .route("/deflate", get(deflate))
        .route("/brotli", any(brotli))
}

#[derive(Serialize)]
struct GzipResponse {
    #[serde(flatten)]
    meta: RequestMeta,
    gzipped: bool,
}

#[derive(Serialize)]
struct DeflateResponse {
    #[serde(flatten)]
    meta: RequestMeta,
    deflated: bool,
}

async fn gzip(meta: RequestMeta) -> Response {
    compressed_json(
        ContentEncoding::Gzip,
        &GzipResponse {
            meta,
            gzipped: true,
        },
    )
}

async fn deflate(meta: RequestMeta) -> Response {
    compressed_json(
        ContentEncoding::Deflate,
        &DeflateResponse {
            meta,
            deflated: true,
        },
    )
}

async fn brotli() -> HttpBinError {
    HttpBinError::NotImplemented
}
