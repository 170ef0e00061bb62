//! Alerting subsystem.
//!
//! # Data Flow
//! ```text
//! AppLogger::exception(message, error)
//!     → trace.rs (ErrorContext captured, TraceFormatter renders text + HTML)
//!     → custom handler registered?
//!         yes → handler.rs (CustomErrorHandler::handle, result returned to caller)
//!         no  → message.rs (Alert::exception) → AlertSender::send (mailgun.rs)
//!
//! AppLogger construction with is_service
//!     → Alert::service_started → AlertSender::send
//! ```
//!
//! # Design Decisions
//! - The mail API is behind the `AlertSender` trait; tests use recording fakes
//! - Every send is bounded by a timeout; failures are logged, never raised
//! - Handler failures are the only errors `exception` returns

pub mod handler;
pub mod mailgun;
pub mod message;
pub mod trace;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use handler::{CustomErrorHandler, ErrorHandler, HandlerError};
pub use mailgun::MailgunSender;
pub use message::Alert;
pub use trace::{ErrorContext, TraceFormatter};

/// Errors that can occur while sending an alert.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The configured endpoint is not a valid URL.
    #[error("Invalid mail endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection, TLS or protocol failure.
    #[error("Mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The mail API answered with a non-success status.
    #[error("Mail API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The send did not finish within the configured bound.
    #[error("Alert send timed out after {0} seconds")]
    Timeout(u64),

    /// Nobody to send to.
    #[error("No alert recipients configured")]
    NoRecipients,
}

/// What the mail API reported for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlertReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outbound alert channel.
#[async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<AlertReceipt, AlertError>;
}
