//! Notification delivery
//!
//! The strategy queues [`Notification`]s on a channel and never waits for
//! delivery. A dispatcher task drains the queue into a [`Notifier`];
//! failures are logged and dropped.

mod discord;
mod email;
mod format;
mod types;

pub use discord::DiscordNotifier;
pub use email::EmailNotifier;
pub use format::{exit_alert, new_hour, resolution, signal_alert, SignalAlert};
pub use types::{Field, Notification, Severity, SignalTag};

use crate::config::NotifyConfig;
use crate::telemetry::{record_fetch_failure, FetchSource};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Sink that only writes to the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        tracing::info!(
            severity = ?notification.severity,
            title = %notification.title,
            "{}",
            notification.summary
        );
        Ok(())
    }
}

/// Sends every notification to the primary sink and BUY signals to the
/// high-confidence sinks as well
pub struct FanOutNotifier {
    primary: Arc<dyn Notifier>,
    buy_sinks: Vec<Arc<dyn Notifier>>,
}

impl FanOutNotifier {
    pub fn new(primary: Arc<dyn Notifier>) -> Self {
        Self {
            primary,
            buy_sinks: Vec::new(),
        }
    }

    pub fn with_buy_sink(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.buy_sinks.push(sink);
        self
    }
}

#[async_trait]
impl Notifier for FanOutNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        let mut failures = Vec::new();
        if let Err(e) = self.primary.send(notification).await {
            failures.push(e);
        }
        if notification.is_buy_signal() {
            for sink in &self.buy_sinks {
                if let Err(e) = sink.send(notification).await {
                    failures.push(e);
                }
            }
        }

        match failures.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }
}

/// Pick the sinks for a configuration
pub fn build_notifier(config: &NotifyConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    let primary: Arc<dyn Notifier> = match &config.webhook_url {
        Some(url) if !url.is_empty() => Arc::new(DiscordNotifier::new(
            url.clone(),
            config.footer.clone(),
            Duration::from_secs(config.timeout_secs),
        )?),
        _ => {
            tracing::warn!("No webhook configured, alerts go to the log only");
            Arc::new(LogNotifier)
        }
    };

    match &config.email {
        Some(email) if email.has_credentials() => {
            tracing::info!(sender = %email.username, "Email alerts enabled for BUY signals");
            let fan_out = FanOutNotifier::new(primary)
                .with_buy_sink(Arc::new(EmailNotifier::new(email)?));
            Ok(Arc::new(fan_out))
        }
        Some(_) => {
            tracing::info!("Email credentials not configured, email alerts disabled");
            Ok(primary)
        }
        None => Ok(primary),
    }
}

/// Deliver queued notifications until every sender is dropped
pub fn spawn_dispatcher(
    notifier: Arc<dyn Notifier>,
    mut rx: mpsc::Receiver<Notification>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if let Err(e) = notifier.send(&notification).await {
                tracing::warn!(
                    error = %e,
                    title = %notification.title,
                    "Failed to deliver notification"
                );
                record_fetch_failure(FetchSource::Notify);
            }
        }
        tracing::debug!("Notification queue closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Recommendation;
    use std::sync::Mutex;

    struct Recording {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("webhook down");
            }
            self.sent.lock().unwrap().push(notification.title.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_in_order() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_dispatcher(Arc::new(Recording { sent: sent.clone(), fail: false }), rx);

        tx.send(Notification::new("a", "first", Severity::Info)).await.unwrap();
        tx.send(Notification::new("b", "second", Severity::Info)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(*sent.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_dispatcher_swallows_failures() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_dispatcher(Arc::new(Recording { sent: sent.clone(), fail: true }), rx);

        tx.send(Notification::new("a", "first", Severity::Info)).await.unwrap();
        drop(tx);
        handle.await.unwrap();
        assert!(sent.lock().unwrap().is_empty());
    }

    fn recorder(fail: bool) -> (Arc<dyn Notifier>, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(Recording {
            sent: sent.clone(),
            fail,
        });
        (sink, sent)
    }

    #[tokio::test]
    async fn test_fan_out_routes_buy_signals() {
        let (primary, primary_sent) = recorder(false);
        let (mail, mail_sent) = recorder(false);
        let notifier = FanOutNotifier::new(primary).with_buy_sink(mail);

        let buy = Notification::new("a", "BUY UP", Severity::Success)
            .signal(Recommendation::Buy, 90);
        let small = Notification::new("b", "SMALL_BET UP", Severity::Warning)
            .signal(Recommendation::SmallBet, 60);
        let exit = Notification::new("c", "STOP LOSS WARNING", Severity::Danger);
        for n in [&buy, &small, &exit] {
            notifier.send(n).await.unwrap();
        }

        assert_eq!(
            *primary_sent.lock().unwrap(),
            vec!["BUY UP", "SMALL_BET UP", "STOP LOSS WARNING"]
        );
        assert_eq!(*mail_sent.lock().unwrap(), vec!["BUY UP"]);
    }

    #[tokio::test]
    async fn test_fan_out_tries_every_sink() {
        let (primary, _) = recorder(true);
        let (mail, mail_sent) = recorder(false);
        let notifier = FanOutNotifier::new(primary).with_buy_sink(mail);

        let buy = Notification::new("a", "BUY UP", Severity::Success)
            .signal(Recommendation::Buy, 80);
        assert!(notifier.send(&buy).await.is_err());
        assert_eq!(*mail_sent.lock().unwrap(), vec!["BUY UP"]);
    }

    #[test]
    fn test_build_notifier_email_without_credentials() {
        let mut config = NotifyConfig::default();
        config.email = Some(toml::from_str(r#"username = "bot@example.com""#).unwrap());
        assert!(build_notifier(&config).is_ok());
    }

    #[test]
    fn test_build_notifier_without_webhook() {
        assert!(build_notifier(&NotifyConfig::default()).is_ok());
    }
}
