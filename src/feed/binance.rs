//! Binance combined aggTrade stream

use super::{PriceFeed, PriceTick};
use crate::ws::{WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Combined-stream envelope: `{"stream": "...", "data": {...}}`
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[allow(dead_code)]
    stream: String,
    data: BinanceTradeMessage,
}

/// Binance aggTrade / trade payload
#[derive(Debug, Deserialize)]
struct BinanceTradeMessage {
    /// Event type
    #[serde(rename = "e")]
    event_type: String,
    /// Symbol
    #[serde(rename = "s")]
    symbol: String,
    /// Price
    #[serde(rename = "p")]
    price: String,
    /// Trade time (milliseconds)
    #[serde(rename = "T")]
    trade_time: i64,
}

/// Binance feed multiplexing several symbols over one combined stream
pub struct BinanceFeed {
    base_url: String,
    symbols: Vec<String>,
}

impl BinanceFeed {
    /// Create a feed for the given symbols on a combined-stream endpoint
    pub fn new(base_url: impl Into<String>, symbols: &[&str]) -> Self {
        Self {
            base_url: base_url.into(),
            symbols: symbols.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Build the combined-stream URL, e.g. `.../stream?streams=ethusdt@aggTrade/btcusdt@aggTrade`
    fn build_ws_url(&self) -> String {
        let streams: Vec<String> = self
            .symbols
            .iter()
            .map(|s| format!("{s}@aggTrade"))
            .collect();
        format!("{}?streams={}", self.base_url, streams.join("/"))
    }

    /// Parse a combined-stream or bare trade message into a PriceTick
    fn parse_message(msg: &str) -> Option<PriceTick> {
        let trade = match serde_json::from_str::<StreamEnvelope>(msg) {
            Ok(envelope) => envelope.data,
            Err(_) => serde_json::from_str::<BinanceTradeMessage>(msg).ok()?,
        };

        if trade.event_type != "aggTrade" && trade.event_type != "trade" {
            return None;
        }

        let price = Decimal::from_str(&trade.price).ok()?;
        let exchange_ts = Utc.timestamp_millis_opt(trade.trade_time).single()?;

        Some(PriceTick {
            symbol: trade.symbol,
            price,
            timestamp: Utc::now(),
            exchange_ts,
        })
    }

    /// Run the message processing loop
    async fn run_message_loop(
        mut ws_rx: mpsc::Receiver<WsMessage>,
        tick_tx: mpsc::Sender<PriceTick>,
    ) {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => {
                    if let Some(tick) = Self::parse_message(&text) {
                        if tick_tx.send(tick).await.is_err() {
                            tracing::debug!("Tick receiver dropped, stopping feed");
                            break;
                        }
                    }
                }
                WsMessage::Connected => {
                    tracing::info!("Binance feed connected");
                }
                WsMessage::Disconnected => {
                    tracing::warn!("Binance feed disconnected");
                    break;
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::warn!(attempt, "Binance feed reconnecting...");
                }
            }
        }
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    async fn subscribe(
        &self,
        shutdown: broadcast::Receiver<()>,
    ) -> anyhow::Result<mpsc::Receiver<PriceTick>> {
        anyhow::ensure!(!self.symbols.is_empty(), "no symbols to subscribe to");

        let (tick_tx, tick_rx) = mpsc::channel(1024);
        let url = self.build_ws_url();

        tracing::info!(symbols = ?self.symbols, "Subscribing to Binance feed");

        let config = WsConfig::new(url)
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(60))
            .ping_interval(Duration::from_secs(30));

        let ws_rx = WsClient::new(config).connect(shutdown);

        tokio::spawn(async move {
            Self::run_message_loop(ws_rx, tick_tx).await;
        });

        Ok(tick_rx)
    }
}
