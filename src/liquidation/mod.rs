//! Liquidation cascade estimates

mod client;
mod estimator;

pub use client::BinanceLiquidations;
pub use estimator::{LiquidatedSide, LiquidationEstimate, OpenInterestTracker};

use async_trait::async_trait;

/// Source of liquidation volume; failures are reported as zero volume
#[async_trait]
pub trait LiquidationSource: Send + Sync {
    async fn liquidations(&self, symbol: &str) -> LiquidationEstimate;
}

/// Source used when liquidation tracking is disabled
pub struct NoLiquidations;

#[async_trait]
impl LiquidationSource for NoLiquidations {
    async fn liquidations(&self, _symbol: &str) -> LiquidationEstimate {
        LiquidationEstimate::none()
    }
}
