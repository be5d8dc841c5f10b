//! Static and trivially derived content: pages, documents, images and
//! small formatting helpers.

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
    Engine,
};
use serde::Serialize;
use serde_json::json;

use crate::error::HttpBinError;
use crate::handlers::redirect::redirect_response;
use crate::handlers::status::status_response;
use crate::http::response::{bytes, ok_json, HTML_CONTENT_TYPE, TEXT_CONTENT_TYPE};
use crate::http::AppState;

const INDEX_HTML: &str = include_str!("../../assets/templates/index.html");
const FORMS_POST_HTML: &str = include_str!("../../assets/templates/forms-post.html");
const SAMPLE_HTML: &str = include_str!("../../assets/templates/sample.html");
const UTF8_HTML: &str = include_str!("../../assets/templates/utf8.html");
const SAMPLE_XML: &str = include_str!("../../assets/templates/sample.xml");

const PNG: &[u8] = include_bytes!("../../assets/images/sample.png");
const JPEG: &[u8] = include_bytes!("../../assets/images/sample.jpeg");
const WEBP: &[u8] = include_bytes!("../../assets/images/sample.webp");
const GIF: &[u8] = include_bytes!("../../assets/images/sample.gif");
const SVG: &[u8] = include_bytes!("../../assets/images/sample.svg");

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /deny\n";

const ANGRY_ASCII: &str = r#"
          .-''''''-.
        .' _      _ '.
       /   O      O   \
      :                :
      |                |
      :       __       :
       \  .-"`  `"-.  /
        '.          .'
          '-......-'
     YOU SHOULDN'T BE HERE
"#;

/// Upper bound on links rendered by `/links/{n}`.
pub const MAX_LINKS: usize = 200;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { bytes(StatusCode::OK, HTML_CONTENT_TYPE, INDEX_HTML) }))
        .route(
            "/forms/post",
            get(|| async { bytes(StatusCode::OK, HTML_CONTENT_TYPE, FORMS_POST_HTML) }),
        )
        .route(
            "/encoding/utf8",
            get(|| async { bytes(StatusCode::OK, HTML_CONTENT_TYPE, UTF8_HTML) }),
        )
        .route("/html", get(|| async { bytes(StatusCode::OK, HTML_CONTENT_TYPE, SAMPLE_HTML) }))
        .route("/xml", get(|| async { bytes(StatusCode::OK, "application/xml", SAMPLE_XML) }))
        .route("/json", get(sample_json))
        .route(
            "/robots.txt",
            get(|| async { bytes(StatusCode::OK, TEXT_CONTENT_TYPE, ROBOTS_TXT) }),
        )
        .route("/deny", get(|| async { bytes(StatusCode::OK, TEXT_CONTENT_TYPE, ANGRY_ASCII) }))
        .route("/uuid", get(new_uuid))
        .route("/base64/{value}", get(base64_decode))
        .route("/base64/decode/{value}", get(base64_decode))
        .route("/base64/encode/{value}", get(base64_encode))
        .route("/links/{n}", get(links_redirect))
        .route("/links/{n}/{offset}", get(links))
        .route("/image", get(image))
        .route("/image/{format}", get(image_format))
}

async fn sample_json() -> Response {
    ok_json(&json!({
        "slideshow": {
            "author": "Yours Truly",
            "date": "date of publication",
            "slides": [
                {"title": "Wake up to WonderWidgets!", "type": "all"},
                {
                    "items": [
                        "Why <em>WonderWidgets</em> are great",
                        "Who <em>buys</em> WonderWidgets"
                    ],
                    "title": "Overview",
                    "type": "all"
                }
            ],
            "title": "Sample Slide Show"
        }
    }))
}

#[derive(Serialize)]
struct UuidResponse {
    uuid: uuid::Uuid,
}

async fn new_uuid() -> Response {
    ok_json(&UuidResponse {
        uuid: uuid::Uuid::new_v4(),
    })
}

/// Decode URL-safe or standard base64, padded or not.
pub fn decode_base64(value: &str) -> Result<Vec<u8>, HttpBinError> {
    let trimmed = value.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| HttpBinError::bad_request(format!("invalid base64 data: {}", e)))
}

async fn base64_decode(Path(value): Path<String>) -> Result<Response, HttpBinError> {
    let decoded = decode_base64(&value)?;
    Ok(bytes(StatusCode::OK, TEXT_CONTENT_TYPE, decoded))
}

async fn base64_encode(Path(value): Path<String>) -> Response {
    bytes(StatusCode::OK, TEXT_CONTENT_TYPE, URL_SAFE.encode(value.as_bytes()))
}

fn parse_link_count(raw: &str) -> Result<usize, HttpBinError> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_LINKS).contains(n))
        .ok_or_else(|| {
            HttpBinError::bad_request(format!("link count must be between 1 and {}", MAX_LINKS))
        })
}

async fn links_redirect(Path(n): Path<String>) -> Result<Response, HttpBinError> {
    let n = parse_link_count(&n)?;
    redirect_response(StatusCode::FOUND, &format!("/links/{}/0", n))
}

async fn links(Path((n, offset)): Path<(String, String)>) -> Result<Response, HttpBinError> {
    let n = parse_link_count(&n)?;
    let offset: usize = offset
        .parse()
        .map_err(|_| HttpBinError::bad_request(format!("invalid offset: {:?}", offset)))?;
    Ok(bytes(StatusCode::OK, HTML_CONTENT_TYPE, render_links(n, offset)))
}

pub fn render_links(n: usize, offset: usize) -> String {
    let mut page = String::from("<html><head><title>Links</title></head><body>");
    for i in 0..n {
        if i == offset {
            page.push_str(&format!("{} ", i));
        } else {
            page.push_str(&format!("<a href=\"/links/{}/{}\">{}</a> ", n, i, i));
        }
    }
    page.push_str("</body></html>");
    page
}

/// Image formats served by `/image/{format}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Svg,
    Gif,
}

impl ImageFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "png" => Some(ImageFormat::Png),
            "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            "svg" => Some(ImageFormat::Svg),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// First acceptable format for an `Accept` header, in server preference.
    pub fn negotiate(accept: &str) -> Option<Self> {
        let accept = accept.to_ascii_lowercase();
        if accept.contains("image/webp") {
            Some(ImageFormat::Webp)
        } else if accept.contains("image/svg+xml") {
            Some(ImageFormat::Svg)
        } else if accept.contains("image/jpeg") {
            Some(ImageFormat::Jpeg)
        } else if accept.contains("image/png") || accept.contains("image/*") {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Gif => "image/gif",
        }
    }

    fn data(&self) -> &'static [u8] {
        match self {
            ImageFormat::Png => PNG,
            ImageFormat::Jpeg => JPEG,
            ImageFormat::Webp => WEBP,
            ImageFormat::Svg => SVG,
            ImageFormat::Gif => GIF,
        }
    }

    fn response(&self) -> Response {
        bytes(StatusCode::OK, self.content_type(), self.data())
    }
}

async fn image(headers: HeaderMap) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    match ImageFormat::negotiate(accept) {
        Some(format) => format.response(),
        None => status_response(StatusCode::NOT_ACCEPTABLE),
    }
}

async fn image_format(Path(format): Path<String>) -> Result<Response, HttpBinError> {
    ImageFormat::from_name(&format)
        .map(|f| f.response())
        .ok_or(HttpBinError::NotFound)
}
