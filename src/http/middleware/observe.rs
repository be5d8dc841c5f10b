//! Observer hook.
//!
//! Wraps the response body so the observer fires once the last byte has been
//! handed to the connection, or the body was dropped because the client went
//! away. Streaming endpoints are therefore measured end to end.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::observability::{Observer, Outcome};

pub async fn observe(
    State(observer): State<Arc<dyn Observer>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let (parts, body) = next.run(request).await.into_parts();

    let guard = ObservationGuard {
        observer,
        outcome: Some(Outcome {
            method,
            uri,
            status: parts.status,
            size: 0,
            duration: Duration::ZERO,
        }),
        start,
    };

    Response::from_parts(parts, Body::new(ObservedBody { inner: body, guard }))
}

/// Reports the outcome exactly once: at end of stream or on drop.
struct ObservationGuard {
    observer: Arc<dyn Observer>,
    outcome: Option<Outcome>,
    start: Instant,
}

impl ObservationGuard {
    fn add_bytes(&mut self, n: usize) {
        if let Some(outcome) = self.outcome.as_mut() {
            outcome.size += n as u64;
        }
    }

    fn finish(&mut self) {
        if let Some(mut outcome) = self.outcome.take() {
            outcome.duration = self.start.elapsed();
            self.observer.observe(&outcome);
        }
    }
}

impl Drop for ObservationGuard {
    fn drop(&mut self) {
        self.finish();
    }
}

struct ObservedBody {
    inner: Body,
    guard: ObservationGuard,
}

impl HttpBody for ObservedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.guard.add_bytes(data.len());
                }
            }
            Poll::Ready(None) => this.guard.finish(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
