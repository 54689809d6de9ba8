//! Bounce-risk classification from the futures premium

use crate::config::PremiumConfig;
use crate::signal::Direction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Crowding risk against a directional position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BounceRisk {
    Low,
    Medium,
    High,
}

impl BounceRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            BounceRisk::Low => "LOW",
            BounceRisk::Medium => "MEDIUM",
            BounceRisk::High => "HIGH",
        }
    }
}

/// Mark and index price of a perpetual contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PremiumReading {
    pub mark_price: Decimal,
    pub index_price: Decimal,
    pub funding_rate: Option<Decimal>,
}

impl PremiumReading {
    /// (mark - index) / index * 100, or None for a zero index
    pub fn premium_pct(&self) -> Option<Decimal> {
        if self.index_price.is_zero() {
            return None;
        }
        Some((self.mark_price - self.index_price) / self.index_price * Decimal::ONE_HUNDRED)
    }
}

/// Classification of a reading relative to a direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumAssessment {
    pub premium_pct: Decimal,
    pub crowded: bool,
    pub bounce_risk: BounceRisk,
    pub analysis: String,
}

/// Classifies mark/index premium into bounce risk
#[derive(Debug, Clone)]
pub struct PremiumAnalyzer {
    high: Decimal,
    medium: Decimal,
    room_to_run: Decimal,
}

impl PremiumAnalyzer {
    pub fn new(config: &PremiumConfig) -> Self {
        Self {
            high: config.high_threshold_pct,
            medium: config.medium_threshold_pct,
            room_to_run: config.room_to_run_pct,
        }
    }

    /// Assess the reading for a position in `direction`
    ///
    /// Premium is measured along the direction, so a DOWN position worries
    /// about a negative premium exactly as an UP position worries about a
    /// positive one.
    pub fn assess(
        &self,
        reading: &PremiumReading,
        direction: Direction,
    ) -> Option<PremiumAssessment> {
        let premium_pct = reading.premium_pct()?;
        let along = premium_pct * direction.sign();
        let crowd = match direction {
            Direction::Up => "longs",
            Direction::Down => "shorts",
        };

        let (bounce_risk, crowded, analysis) = if along > self.high {
            (BounceRisk::High, true, format!("{crowd} heavily crowded, reversal likely"))
        } else if along > self.medium {
            (BounceRisk::Medium, true, format!("{crowd} getting crowded"))
        } else if along < -self.room_to_run {
            (BounceRisk::Low, false, format!("{crowd} underpositioned, room to run"))
        } else {
            (BounceRisk::Low, false, "premium neutral".to_string())
        };

        Some(PremiumAssessment {
            premium_pct,
            crowded,
            bounce_risk,
            analysis,
        })
    }
}
