//! Latest-price cache shared between the feed task and the strategy

use super::PriceTick;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};

/// Keeps only the most recent tick per symbol
#[derive(Debug, Default)]
pub struct PriceCache {
    ticks: RwLock<HashMap<String, PriceTick>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a tick, ignoring ones older than what is already cached
    pub async fn update(&self, tick: PriceTick) {
        let key = tick.symbol.to_uppercase();
        let mut ticks = self.ticks.write().await;
        match ticks.get(&key) {
            Some(existing) if existing.exchange_ts > tick.exchange_ts => {}
            _ => {
                ticks.insert(key, tick);
            }
        }
    }

    /// Latest tick for a symbol
    pub async fn latest(&self, symbol: &str) -> Option<PriceTick> {
        self.ticks.read().await.get(&symbol.to_uppercase()).cloned()
    }

    /// Latest price for a symbol
    pub async fn price(&self, symbol: &str) -> Option<Decimal> {
        self.latest(symbol).await.map(|t| t.price)
    }

    /// Seconds since the symbol's last tick arrived, or None if never seen
    pub async fn age_at(&self, symbol: &str, now: DateTime<Utc>) -> Option<Duration> {
        self.latest(symbol).await.map(|t| now - t.timestamp)
    }

    /// Whether the symbol has a tick newer than `max_age`
    pub async fn is_fresh_at(&self, symbol: &str, max_age: Duration, now: DateTime<Utc>) -> bool {
        matches!(self.age_at(symbol, now).await, Some(age) if age <= max_age)
    }

    /// Drain a tick channel into the cache until the sender closes
    pub async fn ingest(&self, mut rx: mpsc::Receiver<PriceTick>) {
        while let Some(tick) = rx.recv().await {
            tracing::trace!(symbol = %tick.symbol, price = %tick.price, "Price tick");
            self.update(tick).await;
        }
        tracing::debug!("Price stream closed");
    }
}
