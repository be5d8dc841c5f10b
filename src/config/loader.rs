//! Configuration loading from command-line flags and environment.

use std::time::Duration;

use clap::Parser;

use crate::config::schema::{
    HttpBinConfig, LogFormat, ServerConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT,
};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Hostname(std::io::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Hostname(e) => {
                write!(f, "use-real-hostname=true but hostname lookup failed: {}", e)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Command-line interface. An environment variable only applies when the
/// matching flag is absent.
#[derive(Debug, Parser)]
#[command(name = "httpbin")]
#[command(about = "HTTP request & response testing service", long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Maximum size of request or response, in bytes
    #[arg(long, env = "MAX_BODY_SIZE", default_value_t = DEFAULT_MAX_BODY_SIZE)]
    pub max_body_size: usize,

    /// Maximum duration a response may take (e.g. "10s", "1m")
    #[arg(
        long,
        env = "MAX_DURATION",
        value_parser = humantime::parse_duration,
        default_value = "10s"
    )]
    pub max_duration: Duration,

    /// Expose the machine hostname in /hostname instead of a dummy value
    #[arg(long)]
    pub use_real_hostname: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this address (e.g. "0.0.0.0:9090")
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// `USE_REAL_HOSTNAME` is honored when set to "1" or "true", in addition
    /// to the flag.
    fn wants_real_hostname(&self) -> bool {
        self.use_real_hostname
            || matches!(
                std::env::var("USE_REAL_HOSTNAME").as_deref(),
                Ok("1") | Ok("true")
            )
    }

    /// Split parsed flags into validated request and server configuration.
    pub fn into_configs(self) -> Result<(HttpBinConfig, ServerConfig), ConfigError> {
        let hostname = if self.wants_real_hostname() {
            hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .map_err(ConfigError::Hostname)?
        } else {
            HttpBinConfig::default().hostname
        };

        let config = HttpBinConfig {
            max_body_size: self.max_body_size,
            max_duration: self.max_duration,
            hostname,
            ..Default::default()
        };
        validate_config(&config).map_err(ConfigError::Validation)?;

        let server = ServerConfig {
            host: self.host,
            port: self.port,
            log_format: self.log_format,
            metrics_address: self.metrics_address,
        };

        Ok((config, server))
    }
}

/// Parse the process arguments into validated configuration.
pub fn load_config() -> Result<(HttpBinConfig, ServerConfig), ConfigError> {
    Cli::parse().into_configs()
}
