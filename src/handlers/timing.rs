//! Time-controlled responses: `/delay/{d}` and `/drip`.
//!
//! # Design Decisions
//! - Every caller-supplied duration is bounded by `max_duration`: delay is
//!   clamped, drip is rejected up front
//! - Waiting is a `select!` between the timer and the shutdown token; a
//!   client disconnect drops the handler future or body stream instead
//! - Drip writes headers first, then one byte per tick; the initial delay
//!   is folded into the first tick

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::{any, get},
    Router,
};
use futures_util::stream;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::HttpBinError;
use crate::handlers::status::parse_status_code;
use crate::http::response::{empty, ok_json, BINARY_CONTENT_TYPE};
use crate::http::{AppState, RequestMeta};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/delay/{delay}", any(delay))
        .route("/drip", get(drip))
}

/// Parse seconds (`1.5`) or a humantime duration (`1500ms`, `2s`).
/// Finite values too large for a `Duration` saturate, so callers can clamp.
pub fn parse_duration(raw: &str) -> Result<Duration, HttpBinError> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<f64>() {
        if !secs.is_finite() || secs < 0.0 {
            return Err(HttpBinError::bad_request(format!("invalid duration: {:?}", raw)));
        }
        return Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX));
    }
    humantime::parse_duration(raw)
        .map_err(|_| HttpBinError::bad_request(format!("invalid duration: {:?}", raw)))
}

/// Sleep for `duration` unless `cancel` fires first. Returns whether the
/// full duration elapsed.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

async fn delay(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    meta: RequestMeta,
) -> Result<Response, HttpBinError> {
    let requested = parse_duration(&raw)?;
    let wait = requested.min(state.config.max_duration);

    if !sleep_or_cancel(wait, &state.cancel).await {
        tracing::debug!(uri = %meta.url, "Delay aborted by shutdown");
        return Ok(empty(StatusCode::SERVICE_UNAVAILABLE));
    }
    Ok(ok_json(&meta))
}

#[derive(Debug, Default, Deserialize)]
struct DripParams {
    duration: Option<String>,
    delay: Option<String>,
    numbytes: Option<String>,
    code: Option<String>,
}

/// Validated drip request.
#[derive(Debug, Clone, PartialEq)]
struct DripPlan {
    duration: Duration,
    delay: Duration,
    numbytes: u64,
    code: StatusCode,
}

impl DripPlan {
    fn from_params(params: &DripParams, state: &AppState) -> Result<Self, HttpBinError> {
        let defaults = &state.config.defaults;
        let duration = match params.duration.as_deref() {
            Some(raw) => parse_duration(raw)?,
            None => defaults.drip_duration,
        };
        let delay = match params.delay.as_deref() {
            Some(raw) => parse_duration(raw)?,
            None => defaults.drip_delay,
        };
        let numbytes = match params.numbytes.as_deref() {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| HttpBinError::bad_request(format!("invalid numbytes: {:?}", raw)))?,
            None => defaults.drip_numbytes,
        };
        let code = match params.code.as_deref() {
            Some(raw) => parse_status_code(raw)?,
            None => StatusCode::OK,
        };

        let total = duration.checked_add(delay);
        if total.map_or(true, |t| t > state.config.max_duration) {
            return Err(HttpBinError::bad_request(format!(
                "duration + delay must not exceed {:?}",
                state.config.max_duration
            )));
        }
        if numbytes > state.config.max_body_size as u64 {
            return Err(HttpBinError::bad_request(format!(
                "numbytes must not exceed {}",
                state.config.max_body_size
            )));
        }

        Ok(Self {
            duration,
            delay,
            numbytes,
            code,
        })
    }

    /// Pause before each byte, after the initial delay.
    fn interval(&self) -> Duration {
        match u32::try_from(self.numbytes) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.duration / n,
            Err(_) => Duration::ZERO,
        }
    }
}

async fn drip(
    State(state): State<AppState>,
    Query(params): Query<DripParams>,
) -> Result<Response, HttpBinError> {
    let plan = DripPlan::from_params(&params, &state)?;
    let interval = plan.interval();
    let cancel = state.cancel.clone();

    struct Tick {
        sent: u64,
        total: u64,
        initial: Duration,
        interval: Duration,
        cancel: CancellationToken,
    }

    let tick = Tick {
        sent: 0,
        total: plan.numbytes,
        initial: plan.delay,
        interval,
        cancel,
    };

    let body = stream::unfold(tick, |mut tick| async move {
        if tick.sent >= tick.total {
            return None;
        }
        let mut wait = tick.interval;
        if tick.sent == 0 {
            wait += tick.initial;
        }
        if !sleep_or_cancel(wait, &tick.cancel).await {
            return None;
        }
        tick.sent += 1;
        Some((Ok::<_, Infallible>(Bytes::from_static(b"*")), tick))
    });

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = plan.code;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(BINARY_CONTENT_TYPE));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(plan.numbytes));
    Ok(response)
}
