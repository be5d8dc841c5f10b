//! Request reflection endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
    routing::{any, delete, get, patch, post, put},
    Router,
};
use serde::Serialize;

use crate::error::HttpBinError;
use crate::http::envelope::{header_map, MultiMap};
use crate::http::response::{ok_json, JSON_CONTENT_TYPE};
use crate::http::{AppState, BodyEnvelope, RequestMeta};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get", get(get_envelope))
        .route("/head", get(get_envelope))
        .route("/delete", delete(body_envelope))
        .route("/patch", patch(body_envelope))
        .route("/post", post(body_envelope))
        .route("/put", put(body_envelope))
        .route("/anything", any(body_envelope))
        .route("/anything/{*rest}", any(body_envelope))
        .route("/ip", get(ip))
        .route("/user-agent", get(user_agent))
        .route("/headers", get(headers))
        .route("/response-headers", get(response_headers).post(response_headers))
        .route("/hostname", get(hostname))
}

/// `GET /get`: args, headers, origin and url.
pub async fn get_envelope(meta: RequestMeta) -> Response {
    ok_json(&meta)
}

/// Body-bearing methods: the GET envelope plus data, files, form and json.
pub async fn body_envelope(envelope: BodyEnvelope) -> Response {
    ok_json(&envelope)
}

#[derive(Serialize)]
struct OriginResponse {
    origin: String,
}

async fn ip(meta: RequestMeta) -> Response {
    ok_json(&OriginResponse {
        origin: meta.origin,
    })
}

#[derive(Serialize)]
struct UserAgentResponse {
    #[serde(rename = "user-agent")]
    user_agent: String,
}

async fn user_agent(headers: HeaderMap) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    ok_json(&UserAgentResponse { user_agent })
}

#[derive(Serialize)]
struct HeadersResponse {
    headers: MultiMap,
}

async fn headers(headers: HeaderMap) -> Response {
    ok_json(&HeadersResponse {
        headers: header_map(&headers),
    })
}

/// Every query pair becomes a response header; the body echoes the
/// resulting header map.
async fn response_headers(meta: RequestMeta) -> Result<Response, HttpBinError> {
    let mut extra = HeaderMap::new();
    for (key, values) in &meta.args {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| HttpBinError::bad_request(format!("invalid header name: {:?}", key)))?;
        for value in values {
            let value = HeaderValue::from_str(value).map_err(|_| {
                HttpBinError::bad_request(format!("invalid header value for {:?}", key))
            })?;
            extra.append(name.clone(), value);
        }
    }

    let mut echoed: BTreeMap<String, Vec<String>> = header_map(&extra);
    echoed
        .entry("Content-Type".to_string())
        .or_insert_with(|| vec![JSON_CONTENT_TYPE.to_string()]);

    let mut response = ok_json(&echoed);
    let headers = response.headers_mut();
    for name in extra.keys() {
        headers.remove(name);
        for value in extra.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    Ok(response)
}

#[derive(Serialize)]
struct HostnameResponse {
    hostname: String,
}

async fn hostname(State(state): State<AppState>) -> Response {
    ok_json(&HostnameResponse {
        hostname: state.config.hostname.clone(),
    })
}
