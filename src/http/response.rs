//! Response encoders.
//!
//! # Responsibilities
//! - Serialize envelopes and endpoint payloads to JSON responses
//! - Build raw byte responses for binary endpoints
//! - Compress serialized payloads for the encoding endpoints
//!
//! # Design Decisions
//! - Buffered responses always carry an exact Content-Length
//! - Serialization of our own types cannot fail in practice, but a failure
//!   still maps to a 500 rather than a panic

use std::io::Write;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use flate2::{
    write::{GzEncoder, ZlibEncoder},
    Compression,
};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json; encoding=utf-8";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Serialize `value` as a JSON response with the given status.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => bytes(status, JSON_CONTENT_TYPE, body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 200 OK JSON response.
pub fn ok_json<T: Serialize>(value: &T) -> Response {
    json(StatusCode::OK, value)
}

/// Buffered response with an explicit content type.
pub fn bytes(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response {
    let body = body.into();
    let mut response = Response::new(Body::from(body.clone()));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    response
}

/// Response with a status and no body.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Supported content encodings for the compression endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
}

impl ContentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Deflate => "deflate",
        }
    }

    /// Compress `input`. "deflate" is the zlib-wrapped format per RFC 9110.
    pub fn encode(&self, input: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            ContentEncoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(input)?;
                encoder.finish()
            }
            ContentEncoding::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(input)?;
                encoder.finish()
            }
        }
    }
}

/// Serialize `value` to JSON and compress it with `encoding`.
pub fn compressed_json<T: Serialize>(encoding: ContentEncoding, value: &T) -> Response {
    let encoded = serde_json::to_vec(value)
        .map_err(std::io::Error::from)
        .and_then(|raw| encoding.encode(&raw));

    match encoded {
        Ok(body) => {
            let mut response = bytes(StatusCode::OK, JSON_CONTENT_TYPE, body);
            response.headers_mut().insert(
                header::CONTENT_ENCODING,
                HeaderValue::from_static(encoding.as_str()),
            );
            response
        }
        Err(e) => {
            tracing::error!(error = %e, encoding = encoding.as_str(), "Failed to encode response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
