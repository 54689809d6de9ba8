//! Run command implementation

use super::live_sources;
use crate::config::Config;
use crate::feed::{BinanceFeed, PriceCache, PriceFeed};
use crate::notify::{build_notifier, spawn_dispatcher, LogNotifier, Notifier};
use crate::strategy::{spawn_status_writer, HourlyStrategy, TaskControl, TaskKind};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Log alerts instead of posting them to the webhook
    #[arg(long)]
    pub dry_run: bool,

    /// Do not append alerts to the signal journal
    #[arg(long)]
    pub no_journal: bool,

    /// Start with a periodic task paused (candles, evaluate, position, status)
    #[arg(long = "pause", value_name = "TASK")]
    pub paused: Vec<TaskKind>,

    /// Keep the latest status snapshot in this JSON file
    #[arg(long, value_name = "PATH")]
    pub status_file: Option<PathBuf>,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let symbols = [config.feed.symbol.as_str(), config.feed.reference_symbol.as_str()];
        let feed = BinanceFeed::new(config.feed.ws_url.clone(), &symbols);
        let prices = Arc::new(PriceCache::new());
        let ticks = feed.subscribe(shutdown_tx.subscribe()).await?;
        let ingest = {
            let prices = Arc::clone(&prices);
            tokio::spawn(async move { prices.ingest(ticks).await })
        };

        let notifier: Arc<dyn Notifier> = if self.dry_run {
            Arc::new(LogNotifier)
        } else {
            build_notifier(&config.notify)?
        };
        let (notify_tx, notify_rx) = mpsc::channel(64);
        let dispatcher = spawn_dispatcher(notifier, notify_rx);

        let sources = live_sources(&config, !self.no_journal)?;
        let (strategy, status) = HourlyStrategy::new(config, sources, prices, notify_tx)?;
        let status_writer = self
            .status_file
            .clone()
            .map(|path| spawn_status_writer(status, path));

        let (control, control_rx) = TaskControl::channel();
        for task in &self.paused {
            tracing::info!(task = task.as_str(), "Starting with task paused");
            control.cancel(*task).await?;
        }
        let engine = tokio::spawn(strategy.run(shutdown_tx.subscribe(), control_rx));

        tokio::signal::ctrl_c().await?;
        tracing::info!("Ctrl-C received, shutting down");
        let _ = shutdown_tx.send(());

        // The strategy owns the last notification sender, so the dispatcher
        // drains once it has stopped.
        engine.await?;
        dispatcher.await?;
        if let Some(writer) = status_writer {
            writer.await?;
        }
        ingest.abort();
        Ok(())
    }
}
