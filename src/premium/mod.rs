//! Futures premium and bounce risk

mod analyzer;
mod client;

pub use analyzer::{BounceRisk, PremiumAnalyzer, PremiumAssessment, PremiumReading};
pub use client::{decode_premium, BinancePremium, CachedPremium, PremiumError};

use async_trait::async_trait;

/// Source of mark/index readings for a perpetual contract
#[async_trait]
pub trait PremiumSource: Send + Sync {
    async fn premium(&self, symbol: &str) -> anyhow::Result<PremiumReading>;
}
