//! Configuration schema definitions.
//!
//! This module defines the configuration structure for a logger instance.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::logging::DEFAULT_FORMAT;

/// Root configuration for one logger instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Service name; also the logger name in every line.
    pub name: String,

    /// Minimum level (critical, error, warning, info, debug, unset).
    /// Unknown names disable filtering.
    pub level: String,

    /// Line template with `{asctime}`, `{name}`, `{levelname}`, `{message}`.
    pub format: String,

    /// Email a trace on `exception` when no custom handler is set.
    pub send_alerts: bool,

    /// Email a "service started" notice on construction.
    pub is_service: bool,

    /// Overrides the OS hostname in topics and alert subjects.
    pub host_alias: Option<String>,

    /// Mail API settings.
    pub alerts: AlertConfig,

    /// Remote control settings; enabled on startup when present.
    pub remote_control: Option<RemoteControlConfig>,
}

impl LoggerConfig {
    /// Defaults for a logger called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            level: "info".to_string(),
            format: DEFAULT_FORMAT.to_string(),
            send_alerts: false,
            is_service: false,
            host_alias: None,
            alerts: AlertConfig::default(),
            remote_control: None,
        }
    }
}

/// Mail API (alert collaborator) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Messages endpoint, e.g. `https://api.mailgun.net/v3/<domain>/messages`.
    pub url: String,

    /// API key, sent as basic auth password for user `api`.
    pub api_key: String,

    /// Sender address.
    pub from: String,

    /// Recipient addresses.
    pub recipients: Vec<String>,

    /// Upper bound for a single send, in seconds.
    pub timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            url: "https://api.mailgun.net/v3/example.com/messages".to_string(),
            api_key: String::new(),
            from: "remote-logger <noreply@example.com>".to_string(),
            recipients: Vec::new(),
            timeout_secs: 10,
        }
    }
}

/// Remote control (MQTT) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteControlConfig {
    /// Broker host name or IP.
    pub server: String,

    /// Broker port.
    pub port: u16,

    /// Last topic segment; operators must know it to send commands.
    pub control_key: String,

    /// Optional broker credentials (applied only when both are set).
    pub username: Option<String>,
    pub password: Option<String>,

    /// MQTT keepalive in seconds.
    pub keepalive_secs: u64,
}

impl RemoteControlConfig {
    pub fn new(server: impl Into<String>, control_key: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            control_key: control_key.into(),
            ..Self::default()
        }
    }

    /// Credentials, only when both username and password are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

impl Default for RemoteControlConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 1883,
            control_key: String::new(),
            username: None,
            password: None,
            keepalive_secs: 10,
        }
    }
}
