//! Request outcome observers.
//!
//! An observer is called exactly once per handled request, after the
//! response body has been fully written or abandoned by the client. It
//! never alters the response. Implementations are shared across every
//! connection task and must tolerate concurrent calls.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode, Uri};

/// Terminal metadata for one request.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub method: Method,
    pub uri: Uri,
    pub status: StatusCode,
    /// Response body bytes actually emitted.
    pub size: u64,
    /// Time from request arrival to the end of the response body.
    pub duration: Duration,
}

/// Capability invoked with the outcome of every request.
pub trait Observer: Send + Sync + 'static {
    fn observe(&self, outcome: &Outcome);
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&self, _outcome: &Outcome) {}
}

/// Emits one structured `info` event per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, outcome: &Outcome) {
        tracing::info!(
            status = outcome.status.as_u16(),
            method = %outcome.method,
            uri = %outcome.uri,
            size_bytes = outcome.size,
            duration_ms = outcome.duration.as_secs_f64() * 1000.0,
            "Request completed"
        );
    }
}

/// Fans one outcome out to several observers, in order.
#[derive(Default, Clone)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn Observer>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl Observer) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for CompositeObserver {
    fn observe(&self, outcome: &Outcome) {
        for observer in &self.observers {
            observer.observe(outcome);
        }
    }
}

impl<F> Observer for F
where
    F: Fn(&Outcome) + Send + Sync + 'static,
{
    fn observe(&self, outcome: &Outcome) {
        self(outcome)
    }
}
