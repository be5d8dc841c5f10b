//! Request-time error taxonomy.
//!
//! Every variant is a client-facing failure local to one request. None of
//! them are server faults, so they are logged at `debug` at most.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors a handler reports back to the caller.
#[derive(Debug, Error)]
pub enum HttpBinError {
    /// Malformed or out-of-range parameter.
    #[error("{0}")]
    BadRequest(String),

    /// Route exists only in its argument-bearing form, or the argument is
    /// outside the servable range.
    #[error("not found")]
    NotFound,

    /// Request body exceeded the configured maximum.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// A conditional request precondition failed.
    #[error("precondition failed")]
    PreconditionFailed,

    /// Content negotiation found nothing acceptable.
    #[error("{0}")]
    NotAcceptable(String),

    /// Endpoint exists upstream but is not supported here.
    #[error("not implemented")]
    NotImplemented,
}

impl HttpBinError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        HttpBinError::BadRequest(detail.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HttpBinError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpBinError::NotFound => StatusCode::NOT_FOUND,
            HttpBinError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpBinError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            HttpBinError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            HttpBinError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, detail: Option<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            detail,
        }
    }
}

impl IntoResponse for HttpBinError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self, "Client error");

        let detail = match &self {
            HttpBinError::BadRequest(_)
            | HttpBinError::PayloadTooLarge { .. }
            | HttpBinError::NotAcceptable(_) => Some(self.to_string()),
            _ => None,
        };

        let mut response = (status, Json(ErrorBody::new(status, detail))).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(crate::http::response::JSON_CONTENT_TYPE),
        );
        response
    }
}

pub type Result<T, E = HttpBinError> = std::result::Result<T, E>;
