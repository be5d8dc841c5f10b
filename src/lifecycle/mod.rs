//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs + http/server.rs):
//!     Running → stop accepting → Draining
//!     Draining → in-flight done, or grace (max duration + 1s) elapsed → Stopped
//!     grace elapsed → cancel suspended handlers, drop remaining connections
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced close after deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::{Lifecycle, LifecycleState, Shutdown};
