//! Price feed types

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single price tick from an exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    /// Trading symbol (e.g., "ETHUSDT")
    pub symbol: String,
    /// Trade price
    pub price: Decimal,
    /// Local timestamp when tick was received
    pub timestamp: DateTime<Utc>,
    /// Exchange timestamp (trade time)
    pub exchange_ts: DateTime<Utc>,
}

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Kline rows that fail the decode boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("kline row has {0} fields, expected at least 6")]
    TooShort(usize),
    #[error("kline field {field} is not a number: {value}")]
    BadNumber { field: &'static str, value: String },
    #[error("kline open time {0} is out of range")]
    BadTime(i64),
}

impl Candle {
    /// Decode a Binance kline row `[openTime, "open", "high", "low", "close", "volume", ...]`
    pub fn from_kline_row(row: &[serde_json::Value]) -> Result<Self, CandleError> {
        if row.len() < 6 {
            return Err(CandleError::TooShort(row.len()));
        }

        let raw_time = row[0].as_i64().ok_or_else(|| CandleError::BadNumber {
            field: "open_time",
            value: row[0].to_string(),
        })?;
        let open_time = Utc
            .timestamp_millis_opt(raw_time)
            .single()
            .ok_or(CandleError::BadTime(raw_time))?;

        Ok(Self {
            open_time,
            open: decimal_field(&row[1], "open")?,
            high: decimal_field(&row[2], "high")?,
            low: decimal_field(&row[3], "low")?,
            close: decimal_field(&row[4], "close")?,
            volume: decimal_field(&row[5], "volume")?,
        })
    }
}

/// Binance sends prices as strings; accept bare numbers too.
fn decimal_field(value: &serde_json::Value, field: &'static str) -> Result<Decimal, CandleError> {
    let parsed = match value {
        serde_json::Value::String(s) => s.parse::<Decimal>().ok(),
        serde_json::Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CandleError::BadNumber {
        field,
        value: value.to_string(),
    })
}
