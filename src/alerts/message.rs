//! Alert messages sent through the mail API.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One email notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub subject: String,
    pub html: String,
}

impl Alert {
    /// Notice sent when a long-running service starts.
    pub fn service_started(host: &str, service: &str, at: DateTime<Utc>) -> Self {
        Self {
            subject: format!("[{}] Service: {} started", host, service),
            html: format!(
                "<body><p>Service {} has started at: {} UTC</p></body>",
                service,
                at.format("%Y-%m-%d %H:%M:%S%.6f")
            ),
        }
    }

    /// Trace sent from `exception`; `html` is the rendered error detail.
    pub fn exception(host: &str, service: &str, html: String) -> Self {
        Self {
            subject: format!("[{}] Exception occurred in service: {}", host, service),
            html,
        }
    }
}
