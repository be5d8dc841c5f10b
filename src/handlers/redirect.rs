//! Redirect chains and `/redirect-to`.

use axum::{
    extract::{Path, Query},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use url::Url;

use crate::error::HttpBinError;
use crate::http::envelope::request_url;
use crate::http::response::empty;
use crate::http::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/redirect/{n}", get(redirect))
        .route("/relative-redirect/{n}", get(relative_redirect))
        .route("/absolute-redirect/{n}", get(absolute_redirect))
        .route(
            "/redirect-to",
            get(redirect_to)
                .post(redirect_to)
                .put(redirect_to)
                .patch(redirect_to)
                .delete(redirect_to),
        )
}

/// Response with `status` and a `Location` header.
pub fn redirect_response(status: StatusCode, location: &str) -> Result<Response, HttpBinError> {
    let value = HeaderValue::from_str(location)
        .map_err(|_| HttpBinError::bad_request(format!("invalid redirect target: {:?}", location)))?;
    let mut response = empty(status);
    response.headers_mut().insert(header::LOCATION, value);
    Ok(response)
}

fn parse_hops(raw: &str) -> Result<u32, HttpBinError> {
    raw.parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| HttpBinError::bad_request(format!("invalid redirect count: {:?}", raw)))
}

/// Target of the next hop: `/get` once the count is exhausted.
fn next_hop(n: u32, kind: &str) -> String {
    if n <= 1 {
        "/get".to_string()
    } else {
        format!("/{}-redirect/{}", kind, n - 1)
    }
}

/// `scheme://host` of the current request, as the client addressed it.
fn base_url(parts: &Parts) -> Option<String> {
    Url::parse(&request_url(parts))
        .ok()
        .filter(|u| u.has_host())
        .map(|u| u.origin().ascii_serialization())
}

fn hop(parts: &Parts, raw: &str, absolute: bool) -> Result<Response, HttpBinError> {
    let n = parse_hops(raw)?;
    let location = if absolute {
        let base = base_url(parts)
            .ok_or_else(|| HttpBinError::bad_request("cannot build absolute URL without a Host"))?;
        format!("{}{}", base, next_hop(n, "absolute"))
    } else {
        next_hop(n, "relative")
    };
    redirect_response(StatusCode::FOUND, &location)
}

#[derive(Debug, Default, Deserialize)]
struct RedirectParams {
    absolute: Option<String>,
}

async fn redirect(
    parts: Parts,
    Path(n): Path<String>,
    Query(params): Query<RedirectParams>,
) -> Result<Response, HttpBinError> {
    let absolute = params
        .absolute
        .is_some_and(|a| a.eq_ignore_ascii_case("true") || a == "1");
    hop(&parts, &n, absolute)
}

async fn relative_redirect(parts: Parts, Path(n): Path<String>) -> Result<Response, HttpBinError> {
    hop(&parts, &n, false)
}

async fn absolute_redirect(parts: Parts, Path(n): Path<String>) -> Result<Response, HttpBinError> {
    hop(&parts, &n, true)
}

#[derive(Debug, Deserialize)]
struct RedirectToParams {
    url: Option<String>,
    status_code: Option<String>,
}

async fn redirect_to(Query(params): Query<RedirectToParams>) -> Result<Response, HttpBinError> {
    let target = params
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| HttpBinError::bad_request("missing required query parameter: url"))?;
    check_redirect_target(&target)?;

    let status = match params.status_code.as_deref() {
        Some(raw) => raw
            .parse::<u16>()
            .ok()
            .filter(|c| (300..=399).contains(c))
            .and_then(|c| StatusCode::from_u16(c).ok())
            .ok_or_else(|| {
                HttpBinError::bad_request(format!("status_code must be a 3xx code: {:?}", raw))
            })?,
        None => StatusCode::FOUND,
    };

    redirect_response(status, &target)
}

/// Only relative references and http(s) URLs may be redirected to.
pub fn check_redirect_target(target: &str) -> Result<(), HttpBinError> {
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(HttpBinError::bad_request(format!(
            "redirect scheme not allowed: {}",
            url.scheme()
        ))),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(e) => Err(HttpBinError::bad_request(format!("invalid url: {}", e))),
    }
}
