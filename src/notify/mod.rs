//! Notifier implementations

pub mod webhook;

use async_trait::async_trait;
use tracing::info;

use crate::common::errors::Result;
use crate::common::traits::Notifier;

pub use webhook::WebhookNotifier;

/// Notifier that only writes to the tracing log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        info!(subject = %subject, "{}", body);
        Ok(())
    }
}
