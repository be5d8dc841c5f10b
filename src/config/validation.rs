//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap and serde handle syntactic)
//! - Validate value ranges (limits > 0, non-empty hostname)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HttpBinConfig → Result<(), Vec<ValidationError>>
//! - Runs once, before the config is handed to the server

use thiserror::Error;

use crate::config::schema::HttpBinConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("max_body_size must be greater than zero")]
    ZeroBodySize,

    #[error("max_duration must be greater than zero")]
    ZeroDuration,

    #[error("hostname must not be empty")]
    EmptyHostname,
}

/// Check a configuration, collecting every violation.
pub fn validate_config(config: &HttpBinConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodySize);
    }
    if config.max_duration.is_zero() {
        errors.push(ValidationError::ZeroDuration);
    }

    if config.hostname.trim().is_empty() {
        errors.push(ValidationError::EmptyHostname);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&HttpBinConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let config = HttpBinConfig {
            max_body_size: 0,
            max_duration: Duration::ZERO,
            hostname: "  ".into(),
            ..Default::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroBodySize));
        assert!(errors.contains(&ValidationError::ZeroDuration));
        assert!(errors.contains(&ValidationError::EmptyHostname));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn small_limits_are_still_valid() {
        let config = HttpBinConfig {
            max_body_size: 1,
            max_duration: Duration::from_millis(1),
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
