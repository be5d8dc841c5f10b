//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Build the route table and wrap it in the middleware pipeline
//! - Serve connections with per-connection tasks (axum::serve)
//! - Drive graceful shutdown: stop accepting, drain with a deadline, force close

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{Request as HttpRequest, Response},
    middleware::{from_fn, from_fn_with_state},
    ServiceExt,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::HttpBinConfig;
use crate::http::middleware::{autohead, observe, preflight};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::observability::{NoopObserver, Observer};
use crate::routing;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HttpBinConfig>,
    /// Cancelled when the shutdown grace period runs out. Suspended
    /// timing handlers select on it alongside their timers.
    pub cancel: CancellationToken,
}

impl AppState {
    pub fn new(config: HttpBinConfig) -> Self {
        Self {
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }
}

/// HTTP server for the testing service.
pub struct HttpServer {
    state: AppState,
    observer: Arc<dyn Observer>,
    lifecycle: Lifecycle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: HttpBinConfig) -> Self {
        Self {
            state: AppState::new(config),
            observer: Arc::new(NoopObserver),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Report every request outcome to `observer`.
    pub fn with_observer(mut self, observer: impl Observer) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Lifecycle handle, for watching Running → Draining → Stopped.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &HttpBinConfig {
        &self.state.config
    }

    /// Run the server until `shutdown` fires and in-flight requests drain,
    /// or the grace period (max duration + slack) runs out.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let grace = self.state.config.shutdown_grace();
        let cancel = self.state.cancel.clone();
        let lifecycle = self.lifecycle.clone();
        let mut drain_signal = shutdown.resubscribe();

        let max_body_size = self.state.config.max_body_size;
        let router = routing::route_table(self.state);
        let app = ServiceBuilder::new()
            .map_response(|response: Response<_>| response.map(Body::new))
            .layer(TraceLayer::new_for_http())
            .layer(from_fn_with_state(self.observer, observe))
            .layer(RequestBodyLimitLayer::new(max_body_size))
            .map_request(|request: HttpRequest<_>| request.map(Body::new))
            .layer(from_fn(preflight))
            .layer(from_fn(autohead))
            .service(router);

        tracing::info!(
            address = %addr,
            max_body_size,
            grace_secs = grace.as_secs_f64(),
            "HTTP server starting"
        );

        let serve = axum::serve(
            listener,
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        });
        let mut serve = std::pin::pin!(serve.into_future());

        tokio::select! {
            result = &mut serve => {
                lifecycle.advance(LifecycleState::Stopped);
                return result;
            }
            _ = drain_signal.recv() => {
                lifecycle.advance(LifecycleState::Draining);
            }
        }

        match tokio::time::timeout(grace, &mut serve).await {
            Ok(result) => {
                result?;
                tracing::info!("All in-flight requests drained");
            }
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs_f64(),
                    "Grace period elapsed, terminating remaining requests"
                );
                cancel.cancel();
            }
        }

        lifecycle.advance(LifecycleState::Stopped);
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
