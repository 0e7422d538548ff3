//! JSON webhook notifier

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::common::errors::{ClientError, Result};
use crate::common::traits::Notifier;

/// Alert payload
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    subject: &'a str,
    body: &'a str,
    /// `subject` and `body` joined, for chat hooks that render one field
    text: String,
}

/// Posts each alert as JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(10))
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, body))]
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let message = WebhookMessage {
            subject,
            body,
            text: format!("{}\n{}", subject, body),
        };

        let response = self.client.post(&self.url).json(&message).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Notification(format!(
                "webhook returned status {}: {}",
                status, text
            )));
        }
        debug!("webhook delivered");
        Ok(())
    }
}
