//! Incrementally emitted bodies: `/stream/{n}`, `/bytes/{n}` and
//! `/stream-bytes/{n}`.
//!
//! Every chunk is a separate body frame, so the transport flushes each one
//! as it is produced. A client disconnect drops the stream, which ends
//! emission without any error being reported.

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use futures_util::stream;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::HttpBinError;
use crate::http::response::{bytes, BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::http::{AppState, RequestMeta};

/// Upper bound on `/stream/{n}` records.
pub const MAX_STREAM_RECORDS: u64 = 100;

/// Upper bound on generated byte bodies.
pub const MAX_GENERATED_BYTES: u64 = 100 * 1024;

const DEFAULT_CHUNK_SIZE: usize = 10 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stream/{n}", get(stream_records))
        .route("/bytes/{n}", get(random_bytes))
        .route("/stream-bytes/{n}", get(stream_bytes))
}

#[derive(Serialize)]
struct StreamRecord<'a> {
    id: u64,
    #[serde(flatten)]
    meta: &'a RequestMeta,
}

async fn stream_records(
    Path(raw): Path<String>,
    meta: RequestMeta,
) -> Result<Response, HttpBinError> {
    let n = raw
        .parse::<u64>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| HttpBinError::bad_request(format!("invalid count: {:?}", raw)))?
        .min(MAX_STREAM_RECORDS);

    let mut lines = Vec::with_capacity(n as usize);
    for id in 0..n {
        let mut line = serde_json::to_vec(&StreamRecord { id, meta: &meta })
            .map_err(|e| HttpBinError::bad_request(format!("cannot encode record: {}", e)))?;
        line.push(b'\n');
        lines.push(Ok::<_, Infallible>(Bytes::from(line)));
    }

    let mut response = Response::new(Body::from_stream(stream::iter(lines)));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    Ok(response)
}

#[derive(Debug, Default, Deserialize)]
struct BytesParams {
    seed: Option<String>,
    chunk_size: Option<String>,
}

fn parse_length(raw: &str) -> Result<usize, HttpBinError> {
    raw.parse::<u64>()
        .ok()
        .filter(|n| *n <= MAX_GENERATED_BYTES)
        .map(|n| n as usize)
        .ok_or_else(|| {
            HttpBinError::bad_request(format!(
                "byte count must be between 0 and {}: {:?}",
                MAX_GENERATED_BYTES, raw
            ))
        })
}

/// Seeded generator when `seed` is given, entropy-seeded otherwise.
pub fn generator(seed: Option<&str>) -> Result<StdRng, HttpBinError> {
    match seed {
        Some(raw) => raw
            .parse::<u64>()
            .map(StdRng::seed_from_u64)
            .map_err(|_| HttpBinError::bad_request(format!("invalid seed: {:?}", raw))),
        None => Ok(StdRng::from_entropy()),
    }
}

fn parse_chunk_size(raw: Option<&str>) -> Result<usize, HttpBinError> {
    match raw {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| HttpBinError::bad_request(format!("invalid chunk_size: {:?}", raw))),
        None => Ok(DEFAULT_CHUNK_SIZE),
    }
}

async fn random_bytes(
    Path(raw): Path<String>,
    Query(params): Query<BytesParams>,
) -> Result<Response, HttpBinError> {
    let n = parse_length(&raw)?;
    let mut rng = generator(params.seed.as_deref())?;
    let mut buf = vec![0u8; n];
    rng.fill_bytes(&mut buf);
    Ok(bytes(StatusCode::OK, BINARY_CONTENT_TYPE, buf))
}

async fn stream_bytes(
    Path(raw): Path<String>,
    Query(params): Query<BytesParams>,
) -> Result<Response, HttpBinError> {
    let n = parse_length(&raw)?;
    let mut rng = generator(params.seed.as_deref())?;
    let chunk_size = parse_chunk_size(params.chunk_size.as_deref())?;

    let chunks = stream::iter((0..n).step_by(chunk_size).map(move |offset| {
        let mut chunk = vec![0u8; chunk_size.min(n - offset)];
        rng.fill_bytes(&mut chunk);
        Ok::<_, Infallible>(Bytes::from(chunk))
    }));

    let mut response = Response::new(Body::from_stream(chunks));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(BINARY_CONTENT_TYPE));
    Ok(response)
}
