//! Price feed module
//!
//! Live last-trade prices from the Binance combined stream, kept in a
//! shared [`PriceCache`], plus hourly candles from the klines endpoint.

mod binance;
mod cache;
mod klines;
mod types;

pub use binance::BinanceFeed;
pub use cache::PriceCache;
pub use klines::{decode_klines, BinanceKlines};
pub use types::{Candle, CandleError, PriceTick};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

/// Trait for price feed implementations
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Subscribe to price updates until `shutdown` fires
    async fn subscribe(
        &self,
        shutdown: broadcast::Receiver<()>,
    ) -> anyhow::Result<mpsc::Receiver<PriceTick>>;
}

/// Source of OHLCV bars, oldest first
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>>;
}
