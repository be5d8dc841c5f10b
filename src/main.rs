//! httpbin: HTTP request & response testing service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::listener ──▶ http::server (axum::serve)
//!                                            │
//!                          ┌─────────────────┴──────────────────┐
//!                          │         middleware pipeline         │
//!                          │  observer → body limit → preflight  │
//!                          │            → auto-HEAD              │
//!                          └─────────────────┬──────────────────┘
//!                                            ▼
//!                                 routing::route_table
//!                                            │
//!            ┌──────────┬──────────┬─────────┼─────────┬──────────┬──────────┐
//!            ▼          ▼          ▼         ▼         ▼          ▼          ▼
//!          echo      status    redirect    auth     timing    streaming   content
//!                                  (cookies, digest, cache, encoding, range)
//!
//!     lifecycle: signals → Shutdown → Running → Draining → Stopped
//! ```

use httpbin::config::loader::load_config;
use httpbin::lifecycle::signals::forward_signals;
use httpbin::net::listener;
use httpbin::observability::{
    logging::init_logging,
    metrics::{init_metrics, MetricsObserver},
    CompositeObserver, TracingObserver,
};
use httpbin::{HttpServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, server_config) = load_config()?;
    init_logging(server_config.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        max_body_size = config.max_body_size,
        max_duration = ?config.max_duration,
        hostname = %config.hostname,
        "httpbin starting"
    );

    let mut observer = CompositeObserver::new().with(TracingObserver);
    if let Some(raw) = &server_config.metrics_address {
        match raw.parse() {
            Ok(addr) => {
                init_metrics(addr);
                observer = observer.with(MetricsObserver);
            }
            Err(e) => {
                tracing::error!(metrics_address = %raw, error = %e, "Failed to parse metrics address");
            }
        }
    }

    let listener = match listener::bind(&server_config).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start listener");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    let signals = shutdown.clone();
    tokio::spawn(async move { forward_signals(&signals).await });

    let server = HttpServer::new(config).with_observer(observer);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
