//! Cross-cutting middleware applied around the whole route table.
//!
//! # Data Flow
//! ```text
//! request
//!     → observe.rs (outcome reported once the body is done, sees the
//!       original method and every short-circuited response)
//!     → body limit (tower-http, 413 on declared or actual overflow)
//!     → preflight.rs (OPTIONS answered here, CORS headers on everything)
//!     → autohead.rs (HEAD dispatched as GET, body dropped)
//!     → route table
//! ```

pub mod autohead;
pub mod observe;
pub mod preflight;

pub use autohead::autohead;
pub use observe::observe;
pub use preflight::preflight;

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::observability::{Observer, Outcome};

    fn app() -> Router {
        Router::new().route("/get", get(|| async { "hello" }))
    }

    #[tokio::test]
    async fn preflight_short_circuits_options() {
        let app = app().layer(from_fn(preflight));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/not-a-route")
                    .header(header::ORIGIN, "https://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-custom");
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[tokio::test]
    async fn cors_headers_on_normal_requests() {
        let app = app().layer(from_fn(preflight));
        let response = app
            .oneshot(Request::get("/get").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn autohead_keeps_headers_and_drops_body() {
        let app = Router::new()
            .route(
                "/only-get",
                axum::routing::on(axum::routing::MethodFilter::GET, || async { "hello" }),
            )
            .layer(from_fn(autohead));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/only-get")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Outcome>>);

    impl Observer for Recorder {
        fn observe(&self, outcome: &Outcome) {
            self.0.lock().unwrap().push(outcome.clone());
        }
    }

    #[tokio::test]
    async fn observer_sees_status_and_size_after_body() {
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn Observer> = recorder.clone();
        let app = app().layer(from_fn_with_state(observer, observe));

        let response = app
            .clone()
            .oneshot(Request::get("/get").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(recorder.0.lock().unwrap().is_empty());
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");

        let response = app
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        drop(response);

        let outcomes = recorder.0.lock().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, StatusCode::OK);
        assert_eq!(outcomes[0].size, 5);
        assert_eq!(outcomes[0].method, Method::GET);
        assert_eq!(outcomes[1].status, StatusCode::NOT_FOUND);
        assert_eq!(outcomes[1].uri.path(), "/missing");
    }
}
