//! Metrics collection and exposition.
//!
//! # Metrics
//! - `httpbin_requests_total` (counter): requests by method and status
//! - `httpbin_request_duration_seconds` (histogram): time to last body byte
//! - `httpbin_response_bytes_total` (counter): body bytes emitted
//!
//! # Design Decisions
//! - Recording goes through the global `metrics` recorder; without an
//!   installed exporter every call is a no-op

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::observability::observer::{Observer, Outcome};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Observer that records request outcomes as metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl Observer for MetricsObserver {
    fn observe(&self, outcome: &Outcome) {
        let method = outcome.method.to_string();
        let status = outcome.status.as_u16().to_string();

        metrics::counter!(
            "httpbin_requests_total",
            "method" => method.clone(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!("httpbin_request_duration_seconds", "method" => method)
            .record(outcome.duration.as_secs_f64());
        metrics::counter!("httpbin_response_bytes_total").increment(outcome.size);
    }
}
