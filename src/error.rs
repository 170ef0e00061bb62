//! Crate-level error type.

use thiserror::Error;

use crate::alerts::AlertError;
use crate::config::ConfigError;
use crate::remote::RemoteError;

/// Errors that can occur while building a logger from configuration.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Alert setup failed: {0}")]
    Alert(#[from] AlertError),

    #[error("Remote control setup failed: {0}")]
    Remote(#[from] RemoteError),
}
