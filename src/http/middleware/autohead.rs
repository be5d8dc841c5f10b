//! HEAD-from-GET derivation.
//!
//! A HEAD request is dispatched as GET; the resulting status and headers are
//! kept and the body is discarded. Content-Length is preserved when the GET
//! body had a known size.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use http_body::Body as _;

pub async fn autohead(mut request: Request, next: Next) -> Response {
    if request.method() != Method::HEAD {
        return next.run(request).await;
    }

    *request.method_mut() = Method::GET;
    let (mut parts, body) = next.run(request).await.into_parts();

    if !parts.headers.contains_key(header::CONTENT_LENGTH) {
        if let Some(len) = body.size_hint().exact() {
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        }
    }

    Response::from_parts(parts, Body::empty())
}
