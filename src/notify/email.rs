//! SMTP sink for high-confidence BUY alerts

use super::{Notification, Notifier};
use crate::config::EmailConfig;
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Mails a notification over STARTTLS SMTP
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(config.has_credentials(), "email credentials not configured");

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP host {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        let from = config
            .from
            .as_deref()
            .unwrap_or(&config.username)
            .parse::<Mailbox>()
            .context("Invalid sender address")?;
        let to = config.to.parse::<Mailbox>().context("Invalid recipient address")?;

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    /// Plain-text mail for a notification
    pub fn message(&self, notification: &Notification) -> anyhow::Result<Message> {
        let subject = match notification.signal {
            Some(tag) => format!("SURE SHOT: {} (score {})", notification.title, tag.score),
            None => notification.title.clone(),
        };

        let mut body = format!("{}\n\n{}\n", notification.summary, notification.description);
        for field in &notification.fields {
            body.push_str(&format!("\n{}: {}", field.name, field.value));
        }
        body.push_str(&format!(
            "\n\nTriggered at {}\n",
            notification.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("Failed to build email")
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        let message = self.message(notification)?;
        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        tracing::info!(to = %self.to, title = %notification.title, "Sent email alert");
        Ok(())
    }
}
