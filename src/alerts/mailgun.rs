//! Mailgun-style HTTP mail API client.
//!
//! # Request shape
//! ```text
//! POST {url}
//! Authorization: Basic base64("api:{api_key}")
//! Content-Type: application/x-www-form-urlencoded
//!
//! from=...&to=...&to=...&subject=...&html=...
//! ```

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::alerts::message::Alert;
use crate::alerts::{AlertError, AlertReceipt, AlertSender};
use crate::config::AlertConfig;

/// Sends alerts through a Mailgun-compatible messages endpoint.
#[derive(Debug, Clone)]
pub struct MailgunSender {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    from: String,
    recipients: Vec<String>,
}

impl MailgunSender {
    pub fn new(config: &AlertConfig) -> Result<Self, AlertError> {
        let endpoint = Url::parse(&config.url)
            .map_err(|e| AlertError::InvalidEndpoint(format!("{}: {}", config.url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            recipients: config.recipients.clone(),
        })
    }

    fn form<'a>(&'a self, alert: &'a Alert) -> Vec<(&'static str, &'a str)> {
        let mut form = Vec::with_capacity(self.recipients.len() + 3);
        form.push(("from", self.from.as_str()));
        for recipient in &self.recipients {
            form.push(("to", recipient.as_str()));
        }
        form.push(("subject", alert.subject.as_str()));
        form.push(("html", alert.html.as_str()));
        form
    }
}

#[async_trait]
impl AlertSender for MailgunSender {
    async fn send(&self, alert: &Alert) -> Result<AlertReceipt, AlertError> {
        if self.recipients.is_empty() {
            return Err(AlertError::NoRecipients);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth("api", Some(&self.api_key))
            .form(&self.form(alert))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Mailgun answers {"id": "...", "message": "Queued. Thank you."}
        Ok(response.json::<AlertReceipt>().await.unwrap_or_default())
    }
}
