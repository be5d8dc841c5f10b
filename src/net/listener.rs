//! TCP listener setup.
//!
//! # Responsibilities
//! - Resolve and bind the configured address
//! - Turn bind failures into a descriptive, fatal error

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ServerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Configured address is not a valid socket address.
    Address(String, std::net::AddrParseError),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Address(raw, e) => write!(f, "Invalid listen address {:?}: {}", raw, e),
            ListenerError::Bind(addr, e) => write!(f, "Failed to listen on {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind to the configured address.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ListenerError> {
    let raw = config.bind_address();
    let addr: SocketAddr = raw
        .parse()
        .map_err(|e| ListenerError::Address(raw.clone(), e))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ListenerError::Bind(addr, e))?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(addr),
        "Listener bound"
    );

    Ok(listener)
}
