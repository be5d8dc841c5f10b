//! Simulated status codes: `/status/{code}` and `/unstable`.

use axum::{
    extract::{Path, Query},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::{any, get},
    Router,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::HttpBinError;
use crate::http::response::{bytes, empty, json, ok_json, TEXT_CONTENT_TYPE};
use crate::http::{AppState, RequestMeta};

const TEAPOT: &str = r#"
    -=[ teapot ]=-

       _...._
     .'  _ _ `.
    | ."` ^ `". _,
    \_;`"---"`|//
      |       ;/
      \_     _/
        `"""`
"#;

const FAKE_REALM: &str = "Basic realm=\"Fake Realm\"";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status/{code}", any(status))
        .route("/unstable", get(unstable))
}

async fn status(Path(spec): Path<String>) -> Result<Response, HttpBinError> {
    let choices = parse_status_choices(&spec)?;
    let code = pick_weighted(&choices, fastrand::f64());
    Ok(status_response(code))
}

/// Parse `418` or a weighted list such as `200:0.2,404:0.8`.
/// A missing weight counts as 1.
pub fn parse_status_choices(spec: &str) -> Result<Vec<(StatusCode, f64)>, HttpBinError> {
    let mut choices = Vec::new();
    for item in spec.split(',') {
        let (code, weight) = match item.split_once(':') {
            Some((code, weight)) => {
                let weight: f64 = weight
                    .trim()
                    .parse()
                    .ok()
                    .filter(|w: &f64| w.is_finite() && *w >= 0.0)
                    .ok_or_else(|| HttpBinError::bad_request(format!("invalid weight: {:?}", item)))?;
                (code, weight)
            }
            None => (item, 1.0),
        };
        choices.push((parse_status_code(code)?, weight));
    }
    if choices.iter().all(|(_, w)| *w == 0.0) {
        return Err(HttpBinError::bad_request("weights must not all be zero"));
    }
    Ok(choices)
}

/// Parse a final status code in `200..=599`. Informational 1xx codes are
/// rejected: hyper cannot send one as a final response and would answer 500.
pub fn parse_status_code(raw: &str) -> Result<StatusCode, HttpBinError> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|c| (200..=599).contains(c))
        .and_then(|c| StatusCode::from_u16(c).ok())
        .ok_or_else(|| HttpBinError::bad_request(format!("invalid status code: {:?}", raw)))
}

/// Choose from `choices` using `roll` in `[0, 1)`.
fn pick_weighted(choices: &[(StatusCode, f64)], roll: f64) -> StatusCode {
    let total: f64 = choices.iter().map(|(_, w)| w).sum();
    let mut target = roll * total;
    for (code, weight) in choices {
        if target < *weight {
            return *code;
        }
        target -= weight;
    }
    choices
        .iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map(|(c, _)| *c)
        .unwrap_or(StatusCode::OK)
}

#[derive(Serialize)]
struct NotAcceptableBody {
    message: &'static str,
    accept: [&'static str; 5],
}

/// Response for a simulated status, with the conventional extras.
pub fn status_response(code: StatusCode) -> Response {
    let mut response = match code.as_u16() {
        402 => bytes(code, TEXT_CONTENT_TYPE, "Payment required: please insert coin.\n"),
        406 => json(
            code,
            &NotAcceptableBody {
                message: "Client did not request a supported media type.",
                accept: [
                    "image/webp",
                    "image/svg+xml",
                    "image/jpeg",
                    "image/png",
                    "image/*",
                ],
            },
        ),
        418 => bytes(code, TEXT_CONTENT_TYPE, TEAPOT),
        _ => empty(code),
    };

    let headers = response.headers_mut();
    match code.as_u16() {
        300..=399 if code != StatusCode::NOT_MODIFIED => {
            headers.insert(header::LOCATION, HeaderValue::from_static("/redirect/1"));
        }
        401 => {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(FAKE_REALM));
        }
        402 => {
            headers.insert("x-more-info", HeaderValue::from_static("http://vimeo.com/22053820"));
        }
        407 => {
            headers.insert(header::PROXY_AUTHENTICATE, HeaderValue::from_static(FAKE_REALM));
        }
        418 => {
            headers.insert(
                "x-more-info",
                HeaderValue::from_static("http://tools.ietf.org/html/rfc2324"),
            );
        }
        _ => {}
    }
    response
}

#[derive(Debug, Deserialize)]
struct UnstableParams {
    failure_rate: Option<String>,
    failure_code: Option<String>,
    seed: Option<String>,
}

async fn unstable(
    Query(params): Query<UnstableParams>,
    meta: RequestMeta,
) -> Result<Response, HttpBinError> {
    let failure_rate = match params.failure_rate.as_deref() {
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|r| (0.0..=1.0).contains(r))
            .ok_or_else(|| HttpBinError::bad_request("failure_rate must be in [0, 1]"))?,
        None => 0.5,
    };
    let failure_code = match params.failure_code.as_deref() {
        Some(raw) => parse_status_code(raw)?,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let roll = match params.seed.as_deref() {
        Some(raw) => {
            let seed: u64 = raw
                .parse()
                .map_err(|_| HttpBinError::bad_request(format!("invalid seed: {:?}", raw)))?;
            StdRng::seed_from_u64(seed).gen::<f64>()
        }
        None => fastrand::f64(),
    };

    if roll < failure_rate {
        Ok(status_response(failure_code))
    } else {
        Ok(ok_json(&meta))
    }
}
