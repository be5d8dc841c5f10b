//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → http/middleware/observe.rs (measures status, size, duration)
//!     → observer.rs (Observer capability, tracing/composite impls)
//!     → metrics.rs (Prometheus counters/histograms, optional)
//!
//! Process:
//!     → logging.rs (subscriber init, text or JSON)
//! ```
//!
//! # Design Decisions
//! - Observers are injected, the default is a no-op
//! - One event per request, emitted when the body is finished

pub mod logging;
pub mod metrics;
pub mod observer;

pub use observer::{CompositeObserver, NoopObserver, Observer, Outcome, TracingObserver};
