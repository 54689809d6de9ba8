//! Volatility and volume indicators over completed hourly bars

use crate::feed::Candle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ATR period
pub const ATR_PERIOD: usize = 14;
/// Volume average period; also the minimum history for a snapshot
pub const VOLUME_PERIOD: usize = 20;

/// Indicator values from one candle refresh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Simple mean of the last 14 true ranges
    pub atr14: Decimal,
    /// Simple mean of the last 20 volumes
    pub avg_volume20: Decimal,
}

impl IndicatorSnapshot {
    /// Current bar volume relative to the 20-bar average
    pub fn relative_volume(&self, current_volume: Decimal) -> Option<Decimal> {
        if self.avg_volume20 <= Decimal::ZERO {
            return None;
        }
        Some(current_volume / self.avg_volume20)
    }
}

/// True range of `bar` given the previous close
pub fn true_range(bar: &Candle, prev_close: Decimal) -> Decimal {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

/// Stateless indicator computation
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Compute indicators from completed bars, oldest first
    ///
    /// The in-progress bar must not be included. Returns `None` with fewer
    /// than [`VOLUME_PERIOD`] bars.
    pub fn compute(completed: &[Candle]) -> Option<IndicatorSnapshot> {
        if completed.len() < VOLUME_PERIOD {
            return None;
        }

        let ranges: Vec<Decimal> = completed
            .windows(2)
            .map(|pair| true_range(&pair[1], pair[0].close))
            .collect();
        let recent_ranges = &ranges[ranges.len().saturating_sub(ATR_PERIOD)..];
        let atr14 = recent_ranges.iter().copied().sum::<Decimal>()
            / Decimal::from(recent_ranges.len());

        let recent_bars = &completed[completed.len() - VOLUME_PERIOD..];
        let avg_volume20 = recent_bars.iter().map(|c| c.volume).sum::<Decimal>()
            / Decimal::from(VOLUME_PERIOD);

        Some(IndicatorSnapshot { atr14, avg_volume20 })
    }
}
