//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! `HttpBinConfig` is what request handlers see; `ServerConfig` only matters
//! to the binary that binds the socket.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum size of a request or generated response body, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default upper bound on caller-controlled response timing.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(10);

/// Placeholder exposed by `/hostname` unless the real hostname is requested.
pub const DEFAULT_HOSTNAME: &str = "httpbin";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Extra time granted to in-flight requests on shutdown, on top of the
/// maximum duration.
pub const SHUTDOWN_SLACK: Duration = Duration::from_secs(1);

/// Request-handling configuration, immutable once the server is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpBinConfig {
    /// Max size of an incoming request or generated response body, in bytes.
    pub max_body_size: usize,

    /// Max duration of a request, for endpoints that allow caller control
    /// over timing (e.g. `/delay`, `/drip`).
    #[serde(with = "humantime_serde_compat")]
    pub max_duration: Duration,

    /// Default parameter values.
    pub defaults: DefaultParams,

    /// The hostname exposed via `/hostname`.
    pub hostname: String,
}

impl Default for HttpBinConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_duration: DEFAULT_MAX_DURATION,
            defaults: DefaultParams::default(),
            hostname: DEFAULT_HOSTNAME.to_string(),
        }
    }
}

impl HttpBinConfig {
    /// How long shutdown waits for in-flight requests before forcing close.
    pub fn shutdown_grace(&self) -> Duration {
        self.max_duration + SHUTDOWN_SLACK
    }
}

/// Default values for timing parameters the caller may omit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultParams {
    #[serde(with = "humantime_serde_compat")]
    pub drip_duration: Duration,

    #[serde(with = "humantime_serde_compat")]
    pub drip_delay: Duration,

    pub drip_numbytes: u64,
}

impl Default for DefaultParams {
    fn default() -> Self {
        Self {
            drip_duration: Duration::from_secs(2),
            drip_delay: Duration::from_secs(2),
            drip_numbytes: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Process-level settings: where to listen and how to report.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host part of the bind address.
    pub host: String,

    /// Listening port.
    pub port: u16,

    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus scrape endpoint (e.g. "0.0.0.0:9090"), disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            log_format: LogFormat::Text,
            metrics_address: None,
        }
    }
}

impl ServerConfig {
    /// Bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Durations serialize as human-readable strings ("10s", "2m").
mod humantime_serde_compat {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_httpbin() {
        let config = HttpBinConfig::default();
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.max_duration, Duration::from_secs(10));
        assert_eq!(config.defaults.drip_numbytes, 10);
        assert_eq!(config.hostname, "httpbin");
        assert_eq!(config.shutdown_grace(), Duration::from_secs(11));
    }

    #[test]
    fn durations_round_trip_through_json() {
        let config = HttpBinConfig {
            max_duration: Duration::from_millis(1500),
            ..Default::default()
        };
        let encoded = serde_json::to_string(&config).unwrap();
        assert!(encoded.contains("\"1s 500ms\""));
        let decoded: HttpBinConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.max_duration, Duration::from_millis(1500));
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(server.bind_address(), "127.0.0.1:9000");
    }
}
