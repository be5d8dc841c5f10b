//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, fatal on failure)
//!     → Hand off to HTTP layer (axum::serve)
//!
//! Per request:
//!     headers + remote addr → client_ip.rs → origin string
//! ```

pub mod client_ip;
pub mod listener;

pub use client_ip::client_ip;
