//! Binance futures open-interest source

use super::{LiquidationEstimate, LiquidationSource, OpenInterestTracker};
use crate::config::LiquidationConfig;
use crate::telemetry::{record_fetch_failure, FetchSource};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestResponse {
    open_interest: String,
}

#[derive(Debug, Deserialize)]
struct TickerPriceResponse {
    price: String,
}

struct State {
    tracker: OpenInterestTracker,
    cache: HashMap<String, (Instant, LiquidationEstimate)>,
}

/// Polls `/fapi/v1/openInterest` and `/fapi/v1/ticker/price`
pub struct BinanceLiquidations {
    client: Client,
    base_url: String,
    cache_ttl: Duration,
    state: Mutex<State>,
}

impl BinanceLiquidations {
    pub fn new(config: &LiquidationConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            state: Mutex::new(State {
                tracker: OpenInterestTracker::new(
                    config.min_drop_pct,
                    chrono::Duration::seconds(config.lookback_secs as i64),
                ),
                cache: HashMap::new(),
            }),
        })
    }

    async fn get_decimal<T, F>(&self, path: &str, symbol: &str, pick: F) -> anyhow::Result<Decimal>
    where
        T: for<'de> Deserialize<'de>,
        F: FnOnce(T) -> String,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .with_context(|| format!("Failed to fetch {path}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Binance futures error {} on {}", response.status(), path);
        }

        let body: T = response.json().await.with_context(|| format!("Unexpected {path} shape"))?;
        let raw = pick(body);
        Decimal::from_str(&raw).with_context(|| format!("Bad number {raw} from {path}"))
    }

    async fn fetch(&self, symbol: &str) -> anyhow::Result<(Decimal, Decimal)> {
        let (oi, price) = tokio::join!(
            self.get_decimal("/fapi/v1/openInterest", symbol, |r: OpenInterestResponse| {
                r.open_interest
            }),
            self.get_decimal("/fapi/v1/ticker/price", symbol, |r: TickerPriceResponse| r.price),
        );
        Ok((oi?, price?))
    }
}

#[async_trait]
impl LiquidationSource for BinanceLiquidations {
    async fn liquidations(&self, symbol: &str) -> LiquidationEstimate {
        if let Some((at, estimate)) = self.state.lock().await.cache.get(symbol) {
            if at.elapsed() < self.cache_ttl {
                return *estimate;
            }
        }

        match self.fetch(symbol).await {
            Ok((open_interest, price)) => {
                let mut state = self.state.lock().await;
                let estimate = state.tracker.observe_at(symbol, open_interest, price, Utc::now());
                state.cache.insert(symbol.to_string(), (Instant::now(), estimate));
                estimate
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Liquidation estimate unavailable");
                record_fetch_failure(FetchSource::Liquidation);
                LiquidationEstimate::none()
            }
        }
    }
}
