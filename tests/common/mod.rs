//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use httpbin::config::HttpBinConfig;
use httpbin::observability::{NoopObserver, Observer};
use httpbin::{HttpServer, Lifecycle, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub lifecycle: Lifecycle,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a server with `config` on 127.0.0.1:0.
pub async fn spawn_server(config: HttpBinConfig) -> TestServer {
    spawn_server_with(config, NoopObserver).await
}

pub async fn spawn_server_with(config: HttpBinConfig, observer: impl Observer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).with_observer(observer);
    let lifecycle = server.lifecycle();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestServer {
        addr,
        shutdown,
        lifecycle,
        handle,
    }
}

pub async fn spawn_default() -> TestServer {
    spawn_server(HttpBinConfig::default()).await
}

/// Client that never follows redirects or uses a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

/// Client that follows redirects.
pub fn following_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}
