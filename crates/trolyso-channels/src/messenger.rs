//! Facebook Messenger Send API channel.
//!
//! `POST {graph_url}/{api_version}/me/messages?access_token=…` with
//! `{recipient: {id}, message: {text}}`. Failed sends are retried with a
//! linear backoff (`retry_base × attempt`).

use async_trait::async_trait;
use std::time::Duration;
use trolyso_core::config::MessengerConfig;
use trolyso_core::error::{Result, TroLySoError};
use trolyso_core::traits::Channel;

pub struct MessengerChannel {
    page_access_token: String,
    graph_url: String,
    api_version: String,
    max_attempts: u32,
    retry_base: Duration,
    client: reqwest::Client,
}

impl MessengerChannel {
    pub fn new(config: &MessengerConfig) -> Self {
        if config.page_access_token.is_empty() {
            tracing::warn!("⚠️ PAGE_ACCESS_TOKEN is not set; Messenger delivery will fail");
        }
        Self {
            page_access_token: config.page_access_token.clone(),
            graph_url: config.graph_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            max_attempts: config.max_attempts.max(1),
            retry_base: Duration::from_millis(config.retry_base_ms),
            client: reqwest::Client::new(),
        }
    }

    pub fn has_token(&self) -> bool {
        !self.page_access_token.is_empty()
    }

    fn send_url(&self) -> String {
        format!("{}/{}/me/messages", self.graph_url, self.api_version)
    }

    /// One Send API call, no retries.
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "recipient": { "id": recipient_id },
            "message": { "text": text },
        });

        let response = self
            .client
            .post(self.send_url())
            .query(&[("access_token", self.page_access_token.as_str())])
            .json(&body)
            .send()
            .await
            // The URL carries the page token and must not reach the logs.
            .map_err(|e| {
                TroLySoError::Channel(format!("Messenger request failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TroLySoError::Channel(format!(
                "Messenger API error {status}: {error_text}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for MessengerChannel {
    fn name(&self) -> &str {
        "messenger"
    }

    async fn deliver(&self, recipient_id: &str, text: &str) -> bool {
        if !self.has_token() {
            tracing::error!("❌ Cannot message {recipient_id}: PAGE_ACCESS_TOKEN not configured");
            return false;
        }

        for attempt in 1..=self.max_attempts {
            tracing::debug!(
                "📤 Sending to {recipient_id} (attempt {attempt}/{})",
                self.max_attempts
            );
            match self.send_text(recipient_id, text).await {
                Ok(()) => {
                    tracing::debug!("✅ Message sent to {recipient_id}");
                    return true;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Attempt {attempt} to {recipient_id} failed: {e}");
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_base * attempt).await;
                    }
                }
            }
        }
        tracing::error!(
            "❌ Unable to message {recipient_id} after {} attempts",
            self.max_attempts
        );
        false
    }
}
