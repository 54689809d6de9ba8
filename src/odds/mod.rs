//! Prediction-market odds
//!
//! Market discovery by slug, payload decoding, and the per-hour odds
//! history used for velocity.

mod gamma;
mod slug;
mod tracker;
mod types;

pub use gamma::{decode_events, GammaClient};
pub use slug::{local_hour, market_slug, parse_timezone};
pub use tracker::OddsTracker;
pub use types::{
    MarketOdds, OddsSample, OddsVelocity, PayloadError, VelocityStatus, RESOLVED_PRICE,
};

use async_trait::async_trait;

/// Source of hourly market odds
#[async_trait]
pub trait OddsSource: Send + Sync {
    /// Odds for the market with this slug; `Ok(None)` when absent or undecodable
    async fn market_odds(&self, slug: &str) -> anyhow::Result<Option<MarketOdds>>;
}

/// Human-readable judgement of an entry price
pub fn assess_odds(odds: rust_decimal::Decimal) -> &'static str {
    use rust_decimal::Decimal;
    if odds >= Decimal::new(85, 2) {
        "TOO LATE"
    } else if odds >= Decimal::new(75, 2) {
        "RISKY"
    } else if odds >= Decimal::new(65, 2) {
        "OK"
    } else if odds >= Decimal::new(55, 2) {
        "GOOD"
    } else {
        "GREAT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assess_odds() {
        assert_eq!(assess_odds(dec!(0.40)), "GREAT");
        assert_eq!(assess_odds(dec!(0.55)), "GOOD");
        assert_eq!(assess_odds(dec!(0.65)), "OK");
        assert_eq!(assess_odds(dec!(0.80)), "RISKY");
        assert_eq!(assess_odds(dec!(0.85)), "TOO LATE");
    }
}
