//! Request envelope builder.
//!
//! Captures the observable shape of an inbound request (query, headers,
//! origin, reconstructed URL and, for body-bearing methods, the parsed body)
//! into the canonical JSON envelope returned by the echo endpoints.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use serde_json::Value;

use crate::error::HttpBinError;
use crate::http::server::AppState;
use crate::net::client_ip;

/// Multi-valued string map. Every value for a key is kept, in arrival order.
pub type MultiMap = BTreeMap<String, Vec<String>>;

/// Observable attributes shared by every echo-style response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestMeta {
    pub args: MultiMap,
    pub headers: MultiMap,
    pub origin: String,
    pub url: String,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            args: query_args(parts),
            headers: header_map(&parts.headers),
            origin: origin(parts),
            url: request_url(parts),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestMeta::from_parts(parts))
    }
}

/// Envelope for requests that may carry a body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BodyEnvelope {
    #[serde(flatten)]
    pub meta: RequestMeta,
    pub data: String,
    pub files: MultiMap,
    pub form: MultiMap,
    pub json: Option<Value>,
}

impl FromRequest<AppState> for BodyEnvelope {
    type Rejection = HttpBinError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        build_body_envelope(parts, body, state.config.max_body_size).await
    }
}

/// Build the full envelope, consuming the body exactly once.
pub async fn build_body_envelope(
    parts: Parts,
    body: Body,
    max_body_size: usize,
) -> Result<BodyEnvelope, HttpBinError> {
    let meta = RequestMeta::from_parts(&parts);
    let bytes = read_body(body, max_body_size).await?;
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let mut envelope = BodyEnvelope {
        meta,
        data: String::new(),
        files: MultiMap::new(),
        form: MultiMap::new(),
        json: None,
    };

    match media_type(content_type).as_str() {
        "multipart/form-data" => {
            parse_multipart(content_type, bytes, &mut envelope).await?;
            return Ok(envelope);
        }
        "application/x-www-form-urlencoded" => {
            envelope.form = collect_pairs(url::form_urlencoded::parse(&bytes));
        }
        media if is_json(media) => {
            envelope.json = serde_json::from_slice(&bytes).ok();
        }
        _ => {}
    }

    envelope.data = body_text(content_type, &bytes);
    Ok(envelope)
}

/// Read the whole body, failing with 413 past the limit.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, HttpBinError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            HttpBinError::PayloadTooLarge { limit }
        } else {
            HttpBinError::bad_request(format!("failed to read request body: {}", e))
        }
    })
}

fn is_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

async fn parse_multipart(
    content_type: &str,
    bytes: Bytes,
    envelope: &mut BodyEnvelope,
) -> Result<(), HttpBinError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| HttpBinError::bad_request(format!("invalid multipart body: {}", e)))?;
    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(bytes) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let invalid = |e: multer::Error| HttpBinError::bad_request(format!("invalid multipart body: {}", e));
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                // contents are discarded, only the name is reported
                field.bytes().await.map_err(invalid)?;
                envelope.files.entry(name).or_default().push(file_name);
            }
            None => {
                let value = field.text().await.map_err(invalid)?;
                envelope.form.entry(name).or_default().push(value);
            }
        }
    }
    Ok(())
}

/// UTF-8 bodies verbatim, anything else as a base64 data URL.
fn body_text(content_type: &str, bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let media = if content_type.is_empty() {
                "application/octet-stream"
            } else {
                content_type
            };
            format!("data:{};base64,{}", media, STANDARD.encode(bytes))
        }
    }
}

/// Lowercased media type without parameters.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json(media: &str) -> bool {
    match media.split_once('/') {
        Some((_, subtype)) => subtype == "json" || subtype.ends_with("+json"),
        None => false,
    }
}

fn collect_pairs<'a, I>(pairs: I) -> MultiMap
where
    I: Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
{
    let mut map = MultiMap::new();
    for (k, v) in pairs {
        map.entry(k.into_owned()).or_default().push(v.into_owned());
    }
    map
}

/// Query parameters of a request as a multi-valued map.
pub fn query_args(parts: &Parts) -> MultiMap {
    let query = parts.uri.query().unwrap_or_default();
    collect_pairs(url::form_urlencoded::parse(query.as_bytes()))
}

/// Headers keyed by canonical name (`x-forwarded-for` → `X-Forwarded-For`).
pub fn header_map(headers: &HeaderMap) -> MultiMap {
    let mut map = MultiMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(value);
    }
    map
}

pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Origin of the request as reported to the caller.
pub fn origin(parts: &Parts) -> String {
    let remote = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    client_ip(&parts.headers, &remote)
}

/// Reconstruct the URL the client used, honoring proxy scheme hints.
pub fn request_url(parts: &Parts) -> String {
    let headers = &parts.headers;
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    let scheme = if get("x-forwarded-proto").is_some_and(|p| p.eq_ignore_ascii_case("https"))
        || get("x-forwarded-protocol").is_some_and(|p| p.eq_ignore_ascii_case("https"))
        || get("x-forwarded-ssl").is_some_and(|s| s.eq_ignore_ascii_case("on"))
    {
        "https".to_string()
    } else if let Some(proto) = get("x-forwarded-proto") {
        proto.to_ascii_lowercase()
    } else {
        parts.uri.scheme_str().unwrap_or("http").to_string()
    };

    let host = get("host")
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_default();

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, host, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn canonicalizes_header_names() {
        assert_eq!(canonical_header_name("x-forwarded-for"), "X-Forwarded-For");
        assert_eq!(canonical_header_name("USER-AGENT"), "User-Agent");
        assert_eq!(canonical_header_name("te"), "Te");
    }

    #[test]
    fn keeps_duplicate_query_and_header_values() {
        let p = parts(
            HttpRequest::builder()
                .uri("/get?foo=bar&foo=baz&x=1")
                .header("x-test", "one")
                .header("x-test", "two"),
        );
        let meta = RequestMeta::from_parts(&p);
        assert_eq!(meta.args["foo"], vec!["bar", "baz"]);
        assert_eq!(meta.args["x"], vec!["1"]);
        assert_eq!(meta.headers["X-Test"], vec!["one", "two"]);
    }

    #[test]
    fn url_honors_forwarded_scheme() {
        let p = parts(
            HttpRequest::builder()
                .uri("/get?a=1")
                .header("host", "example.com")
                .header("x-forwarded-proto", "https"),
        );
        assert_eq!(request_url(&p), "https://example.com/get?a=1");

        let p = parts(
            HttpRequest::builder()
                .uri("/anything")
                .header("host", "example.com")
                .header("x-forwarded-ssl", "on"),
        );
        assert_eq!(request_url(&p), "https://example.com/anything");

        let p = parts(HttpRequest::builder().uri("/get").header("host", "localhost:8080"));
        assert_eq!(request_url(&p), "http://localhost:8080/get");
    }

    #[test]
    fn origin_uses_connect_info_when_no_headers() {
        let mut p = parts(HttpRequest::builder().uri("/ip"));
        let addr: SocketAddr = "10.0.0.7:4242".parse().unwrap();
        p.extensions.insert(ConnectInfo(addr));
        assert_eq!(origin(&p), "10.0.0.7:4242");
    }

    #[test]
    fn json_media_types() {
        assert!(is_json("application/json"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/plain"));
        assert_eq!(media_type("Application/JSON; charset=utf-8"), "application/json");
    }

    #[tokio::test]
    async fn parses_json_body() {
        let p = parts(
            HttpRequest::builder()
                .method("POST")
                .uri("/post")
                .header("content-type", "application/json"),
        );
        let env = build_body_envelope(p, Body::from(r#"{"a":[1,2]}"#), 1024)
            .await
            .unwrap();
        assert_eq!(env.json, Some(serde_json::json!({"a": [1, 2]})));
        assert_eq!(env.data, r#"{"a":[1,2]}"#);
    }

    #[tokio::test]
    async fn invalid_json_leaves_field_empty() {
        let p = parts(
            HttpRequest::builder()
                .method("POST")
                .uri("/post")
                .header("content-type", "application/json"),
        );
        let env = build_body_envelope(p, Body::from("{nope"), 1024).await.unwrap();
        assert_eq!(env.json, None);
        assert_eq!(env.data, "{nope");
    }

    #[tokio::test]
    async fn json_ignored_for_other_content_types() {
        let p = parts(
            HttpRequest::builder()
                .method("POST")
                .uri("/post")
                .header("content-type", "text/plain"),
        );
        let env = build_body_envelope(p, Body::from("{}"), 1024).await.unwrap();
        assert_eq!(env.json, None);
    }

    #[tokio::test]
    async fn parses_urlencoded_form() {
        let p = parts(
            HttpRequest::builder()
                .method("POST")
                .uri("/post")
                .header("content-type", "application/x-www-form-urlencoded"),
        );
        let env = build_body_envelope(p, Body::from("a=1&a=2&b=hello+world"), 1024)
            .await
            .unwrap();
        assert_eq!(env.form["a"], vec!["1", "2"]);
        assert_eq!(env.form["b"], vec!["hello world"]);
    }

    #[tokio::test]
    async fn parses_multipart_file_names() {
        let body = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"field\"\r\n\r\n\
            value\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            file contents\r\n\
            --XyZ--\r\n";
        let p = parts(
            HttpRequest::builder()
                .method("POST")
                .uri("/post")
                .header("content-type", "multipart/form-data; boundary=XyZ"),
        );
        let env = build_body_envelope(p, Body::from(body), 4096).await.unwrap();
        assert_eq!(env.form["field"], vec!["value"]);
        assert_eq!(env.files["upload"], vec!["a.txt"]);
        assert!(env.data.is_empty());
    }

    #[tokio::test]
    async fn binary_body_becomes_data_url() {
        let p = parts(
            HttpRequest::builder()
                .method("PUT")
                .uri("/put")
                .header("content-type", "application/octet-stream"),
        );
        let env = build_body_envelope(p, Body::from(vec![0xff, 0xfe]), 1024)
            .await
            .unwrap();
        assert_eq!(env.data, "data:application/octet-stream;base64,//4=");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let p = parts(HttpRequest::builder().method("POST").uri("/post"));
        let err = build_body_envelope(p, Body::from(vec![b'x'; 64]), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpBinError::PayloadTooLarge { limit: 16 }));
    }
}
