//! Gamma API client for hourly market odds
//!
//! Looks up the hour's event by slug and decodes the first market's
//! outcome labels and prices. Gamma delivers both arrays either as JSON
//! arrays or as JSON-encoded strings, so everything funnels through
//! [`decode_events`] before reaching the rest of the crate.

use super::{MarketOdds, OddsSource, PayloadError};
use crate::config::OddsConfig;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    base_url: String,
    client: Client,
}

impl GammaClient {
    pub fn new(config: &OddsConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.gamma_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl OddsSource for GammaClient {
    async fn market_odds(&self, slug: &str) -> anyhow::Result<Option<MarketOdds>> {
        let url = format!("{}/events", self.base_url);

        tracing::debug!(slug, "Fetching hourly market from Gamma API");

        let response = self
            .client
            .get(&url)
            .query(&[("slug", slug)])
            .send()
            .await
            .context("Gamma request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gamma API error: {} - {}", status, body);
        }

        let payload: Value = response.json().await.context("Gamma body is not JSON")?;

        match decode_events(slug, &payload) {
            Ok(odds) => Ok(odds),
            Err(e) => {
                let preview: String = payload.to_string().chars().take(200).collect();
                tracing::warn!(slug, error = %e, preview = %preview, "Undecodable Gamma payload");
                Ok(None)
            }
        }
    }
}

/// Normalize an `/events?slug=` response
///
/// An empty list means the market does not exist (yet) and yields `Ok(None)`.
pub fn decode_events(slug: &str, payload: &Value) -> Result<Option<MarketOdds>, PayloadError> {
    let events = payload.as_array().ok_or(PayloadError::NotAnEventList)?;
    let Some(event) = events.first() else {
        return Ok(None);
    };

    let market = event
        .get("markets")
        .and_then(Value::as_array)
        .and_then(|m| m.first())
        .ok_or(PayloadError::NoMarket)?;

    let outcomes = string_list(market, "outcomes")?;
    let prices = string_list(market, "outcomePrices")?;
    if outcomes.len() != prices.len() {
        return Err(PayloadError::LengthMismatch {
            outcomes: outcomes.len(),
            prices: prices.len(),
        });
    }

    let mut odds = MarketOdds {
        slug: slug.to_string(),
        up: None,
        down: None,
        closed: market
            .get("closed")
            .or_else(|| event.get("closed"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
    };

    for (label, price) in outcomes.iter().zip(&prices) {
        let price = Decimal::from_str(price.trim()).map_err(|e| PayloadError::Undecodable {
            field: "outcomePrices",
            reason: e.to_string(),
        })?;
        match label.to_lowercase().as_str() {
            "up" | "yes" => odds.up = Some(price),
            "down" | "no" => odds.down = Some(price),
            _ => {}
        }
    }

    Ok(Some(odds))
}

/// Read a field that is either a JSON array or a string holding one
fn string_list(market: &Value, field: &'static str) -> Result<Vec<String>, PayloadError> {
    let raw = market.get(field).ok_or(PayloadError::MissingField(field))?;

    let decoded;
    let array = match raw {
        Value::Array(items) => items,
        Value::String(encoded) => {
            decoded = serde_json::from_str::<Value>(encoded).map_err(|e| {
                PayloadError::Undecodable {
                    field,
                    reason: e.to_string(),
                }
            })?;
            decoded.as_array().ok_or_else(|| PayloadError::Undecodable {
                field,
                reason: "not an array".to_string(),
            })?
        }
        _ => {
            return Err(PayloadError::Undecodable {
                field,
                reason: "expected array or string".to_string(),
            })
        }
    };

    array
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(PayloadError::Undecodable {
                field,
                reason: format!("unexpected element {other}"),
            }),
        })
        .collect()
}
