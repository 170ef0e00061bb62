//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that alerting has somewhere to go when it is switched on
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LoggerConfig → Result<(), Vec<ValidationError>>
//! - The level name is never validated; unknown names mean "unset"

use std::fmt;

use url::Url;

use crate::config::schema::{AlertConfig, LoggerConfig, RemoteControlConfig};
use crate::logging::LineFormat;

/// Minimum keepalive accepted by the MQTT client.
pub const MIN_KEEPALIVE_SECS: u64 = 5;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a loaded configuration.
pub fn validate_config(config: &LoggerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "must not be empty"));
    }

    if config.format.is_empty() {
        errors.push(ValidationError::new("format", "must not be empty"));
    } else if !LineFormat::parse(&config.format).has_message() {
        errors.push(ValidationError::new("format", "must contain {message}"));
    }

    if let Some(alias) = &config.host_alias {
        if alias.trim().is_empty() || alias.contains('/') {
            errors.push(ValidationError::new(
                "host_alias",
                "must be non-empty and must not contain '/'",
            ));
        }
    }

    if config.send_alerts || config.is_service {
        validate_alerts(&config.alerts, &mut errors);
    }

    if let Some(remote) = &config.remote_control {
        validate_remote(remote, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_alerts(alerts: &AlertConfig, errors: &mut Vec<ValidationError>) {
    if let Err(e) = Url::parse(&alerts.url) {
        errors.push(ValidationError::new(
            "alerts.url",
            format!("invalid URL '{}': {}", alerts.url, e),
        ));
    }
    if alerts.recipients.is_empty() {
        errors.push(ValidationError::new(
            "alerts.recipients",
            "at least one recipient is required when alerts are enabled",
        ));
    }
    if alerts.timeout_secs == 0 {
        errors.push(ValidationError::new("alerts.timeout_secs", "must be greater than 0"));
    }
}

fn validate_remote(remote: &RemoteControlConfig, errors: &mut Vec<ValidationError>) {
    if remote.server.trim().is_empty() {
        errors.push(ValidationError::new("remote_control.server", "must not be empty"));
    }
    if remote.port == 0 {
        errors.push(ValidationError::new("remote_control.port", "must not be 0"));
    }
    if remote.control_key.is_empty() || remote.control_key.contains(|c: char| matches!(c, '/' | '+' | '#')) {
        errors.push(ValidationError::new(
            "remote_control.control_key",
            "must be non-empty and free of '/', '+' and '#'",
        ));
    }
    if remote.keepalive_secs < MIN_KEEPALIVE_SECS {
        errors.push(ValidationError::new(
            "remote_control.keepalive_secs",
            format!("must be at least {}", MIN_KEEPALIVE_SECS),
        ));
    }
    if remote.username.is_some() != remote.password.is_some() {
        errors.push(ValidationError::new(
            "remote_control.username",
            "username and password must be set together",
        ));
    }
}
