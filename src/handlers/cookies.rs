//! Cookie inspection and manipulation. Nothing is stored server-side: the
//! cookie set lives in the request's `Cookie` headers and the response's
//! `Set-Cookie` headers.

use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::error::HttpBinError;
use crate::handlers::redirect::redirect_response;
use crate::http::response::ok_json;
use crate::http::{AppState, RequestMeta};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cookies", get(cookies))
        .route("/cookies/set", get(set_cookies))
        .route("/cookies/delete", get(delete_cookies))
}

#[derive(Serialize)]
struct CookiesResponse {
    cookies: BTreeMap<String, String>,
}

async fn cookies(headers: HeaderMap) -> Response {
    ok_json(&CookiesResponse {
        cookies: parse_cookies(&headers),
    })
}

/// Name/value pairs from every `Cookie` header. Later duplicates win.
pub fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

async fn set_cookies(meta: RequestMeta) -> Result<Response, HttpBinError> {
    let mut response = redirect_response(StatusCode::FOUND, "/cookies")?;
    for (name, values) in &meta.args {
        if let Some(value) = values.last() {
            let cookie = format!("{}={}; Path=/", name, value);
            response
                .headers_mut()
                .append(header::SET_COOKIE, cookie_header(&cookie)?);
        }
    }
    Ok(response)
}

async fn delete_cookies(meta: RequestMeta) -> Result<Response, HttpBinError> {
    let mut response = redirect_response(StatusCode::FOUND, "/cookies")?;
    for name in meta.args.keys() {
        let cookie = format!(
            "{}=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/",
            name
        );
        response
            .headers_mut()
            .append(header::SET_COOKIE, cookie_header(&cookie)?);
    }
    Ok(response)
}

fn cookie_header(cookie: &str) -> Result<HeaderValue, HttpBinError> {
    HeaderValue::from_str(cookie)
        .map_err(|_| HttpBinError::bad_request(format!("invalid cookie: {:?}", cookie)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; b=\"two\""));
        headers.append(header::COOKIE, HeaderValue::from_static("c=3;bogus; a=4"));
        let cookies = parse_cookies(&headers);
        assert_eq!(cookies["a"], "4");
        assert_eq!(cookies["b"], "two");
        assert_eq!(cookies["c"], "3");
        assert!(!cookies.contains_key("bogus"));
    }

    #[tokio::test]
    async fn set_redirects_with_cookies() {
        let (parts, _) = axum::http::Request::builder()
            .uri("/cookies/set?k1=v1&k2=v2")
            .body(())
            .unwrap()
            .into_parts();
        let response = set_cookies(RequestMeta::from_parts(&parts)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/cookies");
        let set: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(set, vec!["k1=v1; Path=/", "k2=v2; Path=/"]);
    }

    #[tokio::test]
    async fn delete_expires_cookies() {
        let (parts, _) = axum::http::Request::builder()
            .uri("/cookies/delete?k1")
            .body(())
            .unwrap()
            .into_parts();
        let response = delete_cookies(RequestMeta::from_parts(&parts)).await.unwrap();
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("k1=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
