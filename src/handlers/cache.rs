//! Conditional requests and cache directives.

use axum::{
    extract::Path,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use chrono::Utc;

use crate::error::HttpBinError;
use crate::http::response::{empty, ok_json};
use crate::http::{AppState, RequestMeta};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cache", get(cache))
        .route("/cache/{seconds}", get(cache_control))
        .route("/etag/{etag}", get(etag))
}

/// Current time as an RFC 7231 HTTP date.
fn http_date_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn header_value(value: String) -> Result<HeaderValue, HttpBinError> {
    HeaderValue::from_str(&value)
        .map_err(|_| HttpBinError::bad_request(format!("invalid header value: {:?}", value)))
}

async fn cache(headers: HeaderMap, meta: RequestMeta) -> Result<Response, HttpBinError> {
    if headers.contains_key(header::IF_MODIFIED_SINCE) || headers.contains_key(header::IF_NONE_MATCH)
    {
        return Ok(empty(StatusCode::NOT_MODIFIED));
    }

    let mut response = ok_json(&meta);
    let out = response.headers_mut();
    out.insert(header::LAST_MODIFIED, header_value(http_date_now())?);
    out.insert(
        header::ETAG,
        header_value(format!("\"{}\"", uuid::Uuid::new_v4().simple()))?,
    );
    Ok(response)
}

async fn cache_control(
    Path(seconds): Path<String>,
    meta: RequestMeta,
) -> Result<Response, HttpBinError> {
    let seconds: u64 = seconds
        .parse()
        .map_err(|_| HttpBinError::bad_request(format!("invalid seconds: {:?}", seconds)))?;
    let mut response = ok_json(&meta);
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header_value(format!("public, max-age={}", seconds))?,
    );
    Ok(response)
}

async fn etag(
    Path(tag): Path<String>,
    headers: HeaderMap,
    meta: RequestMeta,
) -> Result<Response, HttpBinError> {
    let tag = unquote(&tag).to_string();
    let etag_header = header_value(format!("\"{}\"", tag))?;

    let if_none_match = joined(&headers, header::IF_NONE_MATCH);
    if let Some(list) = &if_none_match {
        if matches_any(list, &tag, true) {
            let mut response = empty(StatusCode::NOT_MODIFIED);
            response.headers_mut().insert(header::ETAG, etag_header);
            return Ok(response);
        }
    } else if let Some(list) = joined(&headers, header::IF_MATCH) {
        if !matches_any(&list, &tag, false) {
            return Err(HttpBinError::PreconditionFailed);
        }
    }

    let mut response = ok_json(&meta);
    response.headers_mut().insert(header::ETAG, etag_header);
    Ok(response)
}

/// All values of a list-valued header, comma-joined.
fn joined(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

fn unquote(tag: &str) -> &str {
    tag.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(tag)
}

/// Whether an entity-tag list matches `tag`. Weak comparison accepts
/// `W/` tags; strong comparison rejects them.
fn matches_any(list: &str, tag: &str, weak: bool) -> bool {
    list.split(',').map(str::trim).any(|candidate| {
        if candidate == "*" {
            return true;
        }
        let candidate = match candidate.strip_prefix("W/") {
            Some(_) if !weak => return false,
            Some(stripped) => stripped,
            None => candidate,
        };
        unquote(candidate) == tag
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_tag_matching() {
        assert!(matches_any("\"abc\"", "abc", true));
        assert!(matches_any("\"x\", W/\"abc\"", "abc", true));
        assert!(!matches_any("W/\"abc\"", "abc", false));
        assert!(matches_any("*", "abc", false));
        assert!(!matches_any("\"abd\"", "abc", true));
    }

    #[test]
    fn path_tag_quotes_are_optional() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("\"abc"), "\"abc");
    }

    #[test]
    fn http_date_shape() {
        let date = http_date_now();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.len(), "Sun, 06 Nov 1994 08:49:37 GMT".len());
    }

    #[tokio::test]
    async fn if_match_mismatch_is_412() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_MATCH, HeaderValue::from_static("\"other\""));
        let (parts, _) = axum::http::Request::builder()
            .uri("/etag/abc")
            .body(())
            .unwrap()
            .into_parts();
        let result = etag(
            Path("abc".to_string()),
            headers,
            RequestMeta::from_parts(&parts),
        )
        .await;
        assert!(matches!(result, Err(HttpBinError::PreconditionFailed)));
    }

    #[tokio::test]
    async fn if_none_match_is_304() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));
        let (parts, _) = axum::http::Request::builder()
            .uri("/etag/abc")
            .body(())
            .unwrap()
            .into_parts();
        let response = etag(
            Path("\"abc\"".to_string()),
            headers,
            RequestMeta::from_parts(&parts),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], "\"abc\"");
    }
}
