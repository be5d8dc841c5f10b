//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command-line flags / environment
//!     → loader.rs (clap parse, env fallback, hostname lookup)
//!     → validation.rs (semantic checks)
//!     → HttpBinConfig (validated, immutable)
//!     → shared via Arc to all handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once handed to the server
//! - All fields have defaults so tests can build configs with struct update syntax
//! - Validation separates syntactic (clap) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::DefaultParams;
pub use schema::HttpBinConfig;
pub use schema::LogFormat;
pub use schema::ServerConfig;
