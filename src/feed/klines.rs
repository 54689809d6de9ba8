//! Binance klines REST client

use super::{Candle, CandleSource};
use crate::config::CandleConfig;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fetches hourly bars from `/api/v3/klines`
pub struct BinanceKlines {
    client: Client,
    base_url: String,
}

impl BinanceKlines {
    pub fn new(config: &CandleConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Decode a klines payload, dropping rows that fail validation
pub fn decode_klines(rows: Vec<Vec<serde_json::Value>>) -> Vec<Candle> {
    rows.iter()
        .filter_map(|row| match Candle::from_kline_row(row) {
            Ok(candle) => Some(candle),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed kline row");
                None
            }
        })
        .collect()
}

#[async_trait]
impl CandleSource for BinanceKlines {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("interval", interval), ("limit", limit.as_str())])
            .send()
            .await
            .context("Failed to fetch klines")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {}: {}", status, body);
        }

        let rows: Vec<Vec<serde_json::Value>> =
            response.json().await.context("Failed to parse klines")?;

        let mut candles = decode_klines(rows);
        candles.sort_by_key(|c| c.open_time);
        Ok(candles)
    }
}
