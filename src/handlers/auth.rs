//! Basic, hidden Basic and Bearer challenges.
//!
//! Credentials are compared against the values in the path or query string;
//! nothing is remembered between requests.

use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::HttpBinError;
use crate::http::response::{empty, json, ok_json};
use crate::http::AppState;

const BASIC_CHALLENGE: &str = "Basic realm=\"Fake Realm\"";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/basic-auth/{user}/{passwd}", get(basic_auth))
        .route("/hidden-basic-auth/{user}/{passwd}", get(hidden_basic_auth))
        .route("/bearer", get(bearer))
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    authorized: bool,
    user: String,
}

/// `(user, password)` from an `Authorization: Basic ...` header.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, passwd) = decoded.split_once(':')?;
    Some((user.to_string(), passwd.to_string()))
}

/// Supplied user name, and whether both parts matched.
fn check_basic(headers: &HeaderMap, user: &str, passwd: &str) -> (String, bool) {
    match basic_credentials(headers) {
        Some((u, p)) => {
            let ok = u == user && p == passwd;
            (u, ok)
        }
        None => (String::new(), false),
    }
}

async fn basic_auth(Path((user, passwd)): Path<(String, String)>, headers: HeaderMap) -> Response {
    let (supplied, authorized) = check_basic(&headers, &user, &passwd);
    if authorized {
        return ok_json(&AuthResponse {
            authorized: true,
            user: supplied,
        });
    }
    let mut response = json(
        StatusCode::UNAUTHORIZED,
        &AuthResponse {
            authorized: false,
            user: supplied,
        },
    );
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(BASIC_CHALLENGE),
    );
    response
}

async fn hidden_basic_auth(
    Path((user, passwd)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, HttpBinError> {
    let (supplied, authorized) = check_basic(&headers, &user, &passwd);
    if !authorized {
        return Err(HttpBinError::NotFound);
    }
    Ok(ok_json(&AuthResponse {
        authorized: true,
        user: supplied,
    }))
}

#[derive(Debug, Deserialize)]
struct BearerParams {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct BearerResponse {
    authenticated: bool,
    token: String,
}

async fn bearer(Query(params): Query<BearerParams>, headers: HeaderMap) -> Response {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty());

    let accepted = match (&presented, &params.token) {
        (Some(token), Some(expected)) => token == expected,
        (Some(_), None) => true,
        (None, _) => false,
    };

    match presented {
        Some(token) if accepted => ok_json(&BearerResponse {
            authenticated: true,
            token,
        }),
        _ => {
            let mut response = empty(StatusCode::UNAUTHORIZED);
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            response
        }
    }
}
