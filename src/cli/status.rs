//! Status command implementation

use super::live_sources;
use crate::config::Config;
use crate::feed::{PriceCache, PriceTick};
use crate::strategy::HourlyStrategy;
use chrono::Utc;
use clap::Args;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let sources = live_sources(&config, false)?;
        let prices = Arc::new(PriceCache::new());
        let now = Utc::now();

        // No stream in one-shot mode, the latest closes stand in for ticks.
        for symbol in [&config.feed.symbol, &config.feed.reference_symbol] {
            let bars = sources
                .candles
                .candles(symbol, &config.candles.interval, 1)
                .await?;
            if let Some(bar) = bars.last() {
                prices
                    .update(PriceTick {
                        symbol: symbol.to_uppercase(),
                        price: bar.close,
                        timestamp: now,
                        exchange_ts: now,
                    })
                    .await;
            }
        }

        let (notify_tx, _notify_rx) = mpsc::channel(1);
        let (mut strategy, _) = HourlyStrategy::new(config, sources, prices, notify_tx)?;
        strategy.refresh_candles_at(now).await;
        strategy.refresh_market_at(now).await;

        let snapshot = strategy.snapshot(now).await;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            println!("{}", snapshot.status_line());
        }
        Ok(())
    }
}
