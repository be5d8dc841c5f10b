//! Byte-range requests against a generated alphabet body.

use std::convert::Infallible;
use std::ops::Range;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use futures_util::stream;
use serde::Deserialize;

use crate::error::HttpBinError;
use crate::handlers::streaming::MAX_GENERATED_BYTES;
use crate::http::response::{empty, BINARY_CONTENT_TYPE};
use crate::http::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/range/{n}", get(range))
}

/// Outcome of interpreting a `Range` header against a body of `len` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range: serve everything.
    Full,
    /// One satisfiable range, end exclusive.
    Partial(Range<usize>),
    /// Syntactically valid but outside the body.
    Unsatisfiable,
}

/// Interpret a single `bytes=` range: `a-b`, `a-` or `-suffix`.
/// Anything else (other units, multiple ranges, garbage) is ignored.
pub fn parse_range(header: Option<&str>, len: usize) -> RangeRequest {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeRequest::Full;
    };
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((start, end)) = spec.trim().split_once('-') else {
        return RangeRequest::Full;
    };

    let parse = |s: &str| s.trim().parse::<usize>().ok();
    match (start.trim().is_empty(), end.trim().is_empty()) {
        (true, true) => RangeRequest::Full,
        (true, false) => match parse(end) {
            Some(0) => RangeRequest::Unsatisfiable,
            Some(suffix) => RangeRequest::Partial(len.saturating_sub(suffix)..len),
            None => RangeRequest::Full,
        },
        (false, open_ended) => {
            let Some(first) = parse(start) else {
                return RangeRequest::Full;
            };
            let last = if open_ended {
                len.saturating_sub(1)
            } else {
                match parse(end) {
                    Some(last) if last >= first => last.min(len.saturating_sub(1)),
                    Some(_) => return RangeRequest::Unsatisfiable,
                    None => return RangeRequest::Full,
                }
            };
            if first >= len {
                RangeRequest::Unsatisfiable
            } else {
                RangeRequest::Partial(first..last + 1)
            }
        }
    }
}

/// The repeating lowercase alphabet, `len` bytes long.
pub fn alphabet(range: Range<usize>) -> Vec<u8> {
    range.map(|i| b'a' + (i % 26) as u8).collect()
}

#[derive(Debug, Default, Deserialize)]
struct RangeParams {
    chunk_size: Option<String>,
}

async fn range(
    Path(raw): Path<String>,
    Query(params): Query<RangeParams>,
    headers: HeaderMap,
) -> Result<Response, HttpBinError> {
    let len = raw
        .parse::<u64>()
        .ok()
        .filter(|n| (1..=MAX_GENERATED_BYTES).contains(n))
        .ok_or(HttpBinError::NotFound)? as usize;
    let chunk_size = match params.chunk_size.as_deref() {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| HttpBinError::bad_request(format!("invalid chunk_size: {:?}", raw)))?,
        None => len,
    };

    let requested = parse_range(
        headers.get(header::RANGE).and_then(|v| v.to_str().ok()),
        len,
    );

    let (status, span) = match requested {
        RangeRequest::Full => (StatusCode::OK, 0..len),
        RangeRequest::Partial(span) => (StatusCode::PARTIAL_CONTENT, span),
        RangeRequest::Unsatisfiable => {
            let mut response = empty(StatusCode::RANGE_NOT_SATISFIABLE);
            let out = response.headers_mut();
            out.insert(header::CONTENT_RANGE, content_range(format!("bytes */{}", len))?);
            out.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            return Ok(response);
        }
    };

    let body = alphabet(span.clone());
    let body_len = body.len();
    let chunks: Vec<Result<Bytes, Infallible>> = body
        .chunks(chunk_size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();

    let mut response = Response::new(Body::from_stream(stream::iter(chunks)));
    *response.status_mut() = status;
    let out = response.headers_mut();
    out.insert(header::CONTENT_TYPE, HeaderValue::from_static(BINARY_CONTENT_TYPE));
    out.insert(header::CONTENT_LENGTH, HeaderValue::from(body_len));
    out.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    out.insert(header::ETAG, content_range(format!("range{}", len))?);
    if status == StatusCode::PARTIAL_CONTENT {
        out.insert(
            header::CONTENT_RANGE,
            content_range(format!("bytes {}-{}/{}", span.start, span.end - 1, len))?,
        );
    }
    Ok(response)
}

fn content_range(value: String) -> Result<HeaderValue, HttpBinError> {
    HeaderValue::from_str(&value)
        .map_err(|_| HttpBinError::bad_request(format!("invalid header value: {:?}", value)))
}
