//! Discord webhook sink

use super::{Notification, Notifier};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Posts notifications as Discord embeds
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    footer: String,
}

impl DiscordNotifier {
    pub fn new(
        webhook_url: impl Into<String>,
        footer: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            footer: footer.into(),
        })
    }

    /// Webhook body: `{content, embeds: [embed]}`
    pub fn payload(&self, notification: &Notification) -> Value {
        let fields: Vec<Value> = notification
            .fields
            .iter()
            .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
            .collect();

        json!({
            "content": notification.summary,
            "embeds": [{
                "title": notification.title,
                "description": notification.description,
                "color": notification.severity.color(),
                "fields": fields,
                "footer": { "text": self.footer },
                "timestamp": notification.timestamp.to_rfc3339(),
            }]
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(notification))
            .send()
            .await
            .context("Webhook request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Webhook rejected notification: {} - {}", status, body);
        }
        Ok(())
    }
}
