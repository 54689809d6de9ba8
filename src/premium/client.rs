//! Binance futures premium index client with a short-lived cache

use super::{PremiumReading, PremiumSource};
use crate::config::PremiumConfig;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// `/fapi/v1/premiumIndex` payloads that fail validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PremiumError {
    #[error("field {field} is not a decimal: {value}")]
    BadNumber { field: &'static str, value: String },
    #[error("index price is zero")]
    ZeroIndex,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndexResponse {
    mark_price: String,
    index_price: String,
    #[serde(default)]
    last_funding_rate: Option<String>,
}

fn parse_field(value: &str, field: &'static str) -> Result<Decimal, PremiumError> {
    Decimal::from_str(value).map_err(|_| PremiumError::BadNumber {
        field,
        value: value.to_string(),
    })
}

impl TryFrom<PremiumIndexResponse> for PremiumReading {
    type Error = PremiumError;

    fn try_from(raw: PremiumIndexResponse) -> Result<Self, Self::Error> {
        let mark_price = parse_field(&raw.mark_price, "markPrice")?;
        let index_price = parse_field(&raw.index_price, "indexPrice")?;
        if index_price.is_zero() {
            return Err(PremiumError::ZeroIndex);
        }
        let funding_rate = match raw.last_funding_rate.as_deref() {
            Some(rate) if !rate.is_empty() => Some(parse_field(rate, "lastFundingRate")?),
            _ => None,
        };

        Ok(Self {
            mark_price,
            index_price,
            funding_rate,
        })
    }
}

/// Decode a premium index body
pub fn decode_premium(body: &str) -> anyhow::Result<PremiumReading> {
    let raw: PremiumIndexResponse =
        serde_json::from_str(body).context("Unexpected premiumIndex shape")?;
    Ok(PremiumReading::try_from(raw)?)
}

/// Uncached premium index fetcher
pub struct BinancePremium {
    client: Client,
    base_url: String,
}

impl BinancePremium {
    pub fn new(config: &PremiumConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PremiumSource for BinancePremium {
    async fn premium(&self, symbol: &str) -> anyhow::Result<PremiumReading> {
        let url = format!("{}/fapi/v1/premiumIndex", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .context("Failed to fetch premium index")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance futures error {}: {}", status, body);
        }

        let body = response.text().await.context("Failed to read premium index")?;
        decode_premium(&body)
    }
}

/// Wraps a source with a per-symbol TTL cache
///
/// A fresh entry is served without a request. When a refresh fails, the
/// stale entry is returned instead of the error.
pub struct CachedPremium<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, PremiumReading)>>,
}

impl<S: PremiumSource> CachedPremium<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<S: PremiumSource> PremiumSource for CachedPremium<S> {
    async fn premium(&self, symbol: &str) -> anyhow::Result<PremiumReading> {
        let cached = self.entries.lock().await.get(symbol).copied();
        if let Some((at, reading)) = cached {
            if at.elapsed() < self.ttl {
                return Ok(reading);
            }
        }

        match self.inner.premium(symbol).await {
            Ok(reading) => {
                self.entries
                    .lock()
                    .await
                    .insert(symbol.to_string(), (Instant::now(), reading));
                Ok(reading)
            }
            Err(e) => match cached {
                Some((_, stale)) => {
                    tracing::warn!(
                        symbol,
                        error = %e,
                        "Premium fetch failed, serving stale reading"
                    );
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_decode_premium() {
        let body = r#"{"symbol":"ETHUSDT","markPrice":"3006.00","indexPrice":"3000.00",
            "lastFundingRate":"0.00010000","time":1704067200000}"#;
        let reading = decode_premium(body).unwrap();
        assert_eq!(reading.mark_price, dec!(3006.00));
        assert_eq!(reading.index_price, dec!(3000.00));
        assert_eq!(reading.funding_rate, Some(dec!(0.0001)));
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(decode_premium("[]").is_err());
        assert!(decode_premium(r#"{"markPrice":"x","indexPrice":"1"}"#).is_err());
        assert!(decode_premium(r#"{"markPrice":"1","indexPrice":"0"}"#).is_err());
    }

    /// Counts calls and fails after the first one
    struct FlakySource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PremiumSource for FlakySource {
        async fn premium(&self, _symbol: &str) -> anyhow::Result<PremiumReading> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(PremiumReading {
                    mark_price: dec!(3001),
                    index_price: dec!(3000),
                    funding_rate: None,
                })
            } else {
                anyhow::bail!("connection reset")
            }
        }
    }

    #[tokio::test]
    async fn test_cache_serves_fresh_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FlakySource {
            calls: calls.clone(),
        };
        let cached = CachedPremium::new(source, Duration::from_secs(60));

        cached.premium("ETHUSDT").await.unwrap();
        cached.premium("ETHUSDT").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_prefers_stale_over_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedPremium::new(FlakySource { calls: calls.clone() }, Duration::ZERO);

        let first = cached.premium("ETHUSDT").await.unwrap();
        let second = cached.premium("ETHUSDT").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // nothing cached for another symbol, so the error surfaces
        assert!(cached.premium("BTCUSDT").await.is_err());
    }
}
