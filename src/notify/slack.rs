//! Slack incoming-webhook notifier.
//!
//! Posts `{"type": "mrkdwn", "text": "`\"...\"`"}`: the message is
//! JSON-quoted and wrapped in backticks so Slack renders it as inline code.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use super::Notifier;
use crate::types::HelperError;

#[derive(Debug, Serialize)]
struct SlackPayload {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl SlackPayload {
    fn new(message: &str) -> Result<Self> {
        let quoted = serde_json::to_string(message).context("Failed to quote Slack message")?;
        Ok(Self {
            kind: "mrkdwn",
            text: format!("`{quoted}`"),
        })
    }
}

pub struct SlackNotifier {
    http: Client,
    /// The webhook URL embeds its own token, so it is kept secret.
    webhook_url: SecretString,
}

impl SlackNotifier {
    pub fn new(webhook_url: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for Slack")?;

        Ok(Self { http, webhook_url })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let payload = SlackPayload::new(text)?;

        let resp = self
            .http
            .post(self.webhook_url.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| HelperError::Notification(format!("webhook request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HelperError::Notification(format!("webhook returned {status}: {body}")).into());
        }

        debug!("Slack notification delivered");
        Ok(())
    }
}
