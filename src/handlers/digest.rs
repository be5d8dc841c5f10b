//! Digest access authentication (RFC 7616).
//!
//! # State machine
//! ```text
//! no Authorization ──▶ 401 + challenge (fresh nonce/opaque)
//! Authorization ──▶ recompute HA1/HA2/response from the request alone
//!     match    ──▶ 200 {authenticated, user}
//!     mismatch ──▶ 401 + new challenge
//! ```
//!
//! # Design Decisions
//! - Stateless: the echoed nonce is not checked against an issued set
//! - Nonce = H("<unix nanos>:<random u64>"), opaque = H("httpbin:<random u64>"),
//!   both with the algorithm selected in the path
//! - `auth-int` hashes the request body into HA2

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use md5::Md5;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::HttpBinError;
use crate::http::envelope::read_body;
use crate::http::response::{empty, ok_json};
use crate::http::AppState;

pub const REALM: &str = "httpbin";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/digest-auth/{qop}/{user}/{passwd}", get(digest_auth))
        .route(
            "/digest-auth/{qop}/{user}/{passwd}/{algorithm}",
            get(digest_auth_with_algorithm),
        )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    Auth,
    AuthInt,
}

impl Qop {
    fn parse(raw: &str) -> Result<Self, HttpBinError> {
        match raw {
            "auth" => Ok(Qop::Auth),
            "auth-int" => Ok(Qop::AuthInt),
            _ => Err(HttpBinError::bad_request(format!("invalid qop: {:?}", raw))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha256,
}

impl Algorithm {
    fn parse(raw: &str) -> Result<Self, HttpBinError> {
        if raw.eq_ignore_ascii_case("md5") {
            Ok(Algorithm::Md5)
        } else if raw.eq_ignore_ascii_case("sha-256") {
            Ok(Algorithm::Sha256)
        } else {
            Err(HttpBinError::bad_request(format!("invalid algorithm: {:?}", raw)))
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "MD5",
            Algorithm::Sha256 => "SHA-256",
        }
    }

    /// Lowercase hex digest of `data`.
    pub fn hash(&self, data: &[u8]) -> String {
        match self {
            Algorithm::Md5 => hex::encode(Md5::digest(data)),
            Algorithm::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }
}

/// The inputs a digest response is computed from.
#[derive(Debug)]
pub struct DigestInput<'a> {
    pub algorithm: Algorithm,
    pub username: &'a str,
    pub password: &'a str,
    pub realm: &'a str,
    pub method: &'a str,
    pub uri: &'a str,
    pub nonce: &'a str,
    /// `(qop, nc, cnonce)`; `None` for RFC 2069 clients.
    pub qop: Option<(Qop, &'a str, &'a str)>,
    pub body: &'a [u8],
}

/// Expected `response` value for `input`.
pub fn compute_response(input: &DigestInput<'_>) -> String {
    let h = |s: String| input.algorithm.hash(s.as_bytes());

    let ha1 = h(format!("{}:{}:{}", input.username, input.realm, input.password));
    let ha2 = match input.qop {
        Some((Qop::AuthInt, _, _)) => h(format!(
            "{}:{}:{}",
            input.method,
            input.uri,
            input.algorithm.hash(input.body)
        )),
        _ => h(format!("{}:{}", input.method, input.uri)),
    };

    match input.qop {
        Some((qop, nc, cnonce)) => h(format!(
            "{}:{}:{}:{}:{}:{}",
            ha1,
            input.nonce,
            nc,
            cnonce,
            qop.as_str(),
            ha2
        )),
        None => h(format!("{}:{}:{}", ha1, input.nonce, ha2)),
    }
}

/// Parse the parameter list of a `Digest ...` credentials header.
pub fn parse_authorization(value: &str) -> Option<HashMap<String, String>> {
    let (scheme, rest) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("digest") {
        return None;
    }

    let mut params = HashMap::new();
    let mut chars = rest.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }
        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        if key.is_empty() {
            break;
        }
        let value = if chars.peek() == Some(&'"') {
            chars.next();
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    c => value.push(c),
                }
            }
            value
        } else {
            chars.by_ref().take_while(|c| *c != ',').collect::<String>()
        };
        params.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    Some(params)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// `WWW-Authenticate` value for a fresh challenge.
pub fn challenge(qop: Qop, algorithm: Algorithm) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let nonce = algorithm.hash(format!("{}:{}", nanos, fastrand::u64(..)).as_bytes());
    let opaque = algorithm.hash(format!("{}:{}", REALM, fastrand::u64(..)).as_bytes());
    format!(
        "Digest realm=\"{}\", qop=\"{}\", nonce=\"{}\", opaque=\"{}\", algorithm={}, stale=FALSE",
        REALM,
        qop.as_str(),
        nonce,
        opaque,
        algorithm.as_str()
    )
}

#[derive(Serialize)]
struct DigestResponse {
    authenticated: bool,
    user: String,
}

async fn digest_auth(
    State(state): State<AppState>,
    Path((qop, user, passwd)): Path<(String, String, String)>,
    request: Request,
) -> Result<Response, HttpBinError> {
    handle(&state, &qop, user, passwd, Algorithm::Md5, request).await
}

async fn digest_auth_with_algorithm(
    State(state): State<AppState>,
    Path((qop, user, passwd, algorithm)): Path<(String, String, String, String)>,
    request: Request,
) -> Result<Response, HttpBinError> {
    let algorithm = Algorithm::parse(&algorithm)?;
    handle(&state, &qop, user, passwd, algorithm, request).await
}

async fn handle(
    state: &AppState,
    qop: &str,
    user: String,
    passwd: String,
    algorithm: Algorithm,
    request: Request,
) -> Result<Response, HttpBinError> {
    let qop = Qop::parse(qop)?;
    let (parts, body) = request.into_parts();

    let params = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_authorization);
    let Some(params) = params else {
        return unauthorized(qop, algorithm);
    };

    let body = match qop {
        Qop::AuthInt => read_body(body, state.config.max_body_size).await?,
        Qop::Auth => Default::default(),
    };

    let field = |name: &str| params.get(name).map(String::as_str).unwrap_or_default();
    let client_qop = match params.get("qop").map(String::as_str) {
        Some(raw) => Some((Qop::parse(raw)?, field("nc"), field("cnonce"))),
        None => None,
    };
    let method = if parts.method == Method::HEAD {
        Method::GET
    } else {
        parts.method.clone()
    };

    let expected = compute_response(&DigestInput {
        algorithm,
        username: &user,
        password: &passwd,
        realm: field("realm"),
        method: method.as_str(),
        uri: field("uri"),
        nonce: field("nonce"),
        qop: client_qop,
        body: &body,
    });

    let authorized = field("username") == user
        && constant_time_eq(expected.as_bytes(), field("response").as_bytes());
    if !authorized {
        tracing::debug!(user = %field("username"), "Digest credentials rejected");
        return unauthorized(qop, algorithm);
    }

    Ok(ok_json(&DigestResponse {
        authenticated: true,
        user,
    }))
}

fn unauthorized(qop: Qop, algorithm: Algorithm) -> Result<Response, HttpBinError> {
    let value = HeaderValue::from_str(&challenge(qop, algorithm))
        .map_err(|_| HttpBinError::bad_request("cannot build digest challenge"))?;
    let mut response = empty(StatusCode::UNAUTHORIZED);
    response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    Ok(response)
}
