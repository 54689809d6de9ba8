//! Liquidation estimate from open-interest drops
//!
//! A sharp fall in open interest over a few minutes is mostly forced
//! closing. The USD size of the drop stands in for liquidation volume;
//! the price move tells which side was flushed.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Side that was forced out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidatedSide {
    Long,
    Short,
}

/// Estimated liquidation volume
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LiquidationEstimate {
    pub total_usd: Decimal,
    /// Shorts squeezed (price rose)
    pub short_usd: Decimal,
    /// Longs flushed (price fell)
    pub long_usd: Decimal,
    pub side: Option<LiquidatedSide>,
}

impl LiquidationEstimate {
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy)]
struct OiSnapshot {
    oi_usd: Decimal,
    price: Decimal,
    at: DateTime<Utc>,
}

/// Remembers the previous open-interest reading per symbol
#[derive(Debug, Clone)]
pub struct OpenInterestTracker {
    previous: HashMap<String, OiSnapshot>,
    min_drop_pct: Decimal,
    lookback: Duration,
}

impl OpenInterestTracker {
    pub fn new(min_drop_pct: Decimal, lookback: Duration) -> Self {
        Self {
            previous: HashMap::new(),
            min_drop_pct,
            lookback,
        }
    }

    /// Record a reading (contracts and price) and estimate against the last one
    pub fn observe_at(
        &mut self,
        symbol: &str,
        open_interest: Decimal,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> LiquidationEstimate {
        let current = OiSnapshot {
            oi_usd: open_interest * price,
            price,
            at: now,
        };

        let estimate = match self.previous.insert(symbol.to_string(), current) {
            Some(prev) => self.compare(&prev, &current),
            None => LiquidationEstimate::none(),
        };

        if let Some(side) = estimate.side {
            tracing::info!(
                symbol,
                usd = %estimate.total_usd.round_dp(0),
                ?side,
                "Open interest drop detected"
            );
        }
        estimate
    }

    fn compare(&self, prev: &OiSnapshot, current: &OiSnapshot) -> LiquidationEstimate {
        let drop_usd = prev.oi_usd - current.oi_usd;
        if drop_usd <= Decimal::ZERO || prev.oi_usd.is_zero() {
            return LiquidationEstimate::none();
        }
        let drop_pct = drop_usd / prev.oi_usd * Decimal::ONE_HUNDRED;
        if drop_pct <= self.min_drop_pct || current.at - prev.at >= self.lookback {
            return LiquidationEstimate::none();
        }

        let side = if current.price > prev.price {
            Some(LiquidatedSide::Short)
        } else if current.price < prev.price {
            Some(LiquidatedSide::Long)
        } else {
            None
        };

        LiquidationEstimate {
            total_usd: drop_usd,
            short_usd: if side == Some(LiquidatedSide::Short) { drop_usd } else { Decimal::ZERO },
            long_usd: if side == Some(LiquidatedSide::Long) { drop_usd } else { Decimal::ZERO },
            side,
        }
    }
}
