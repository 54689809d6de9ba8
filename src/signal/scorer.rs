//! Confidence scoring
//!
//! Additive, capped score over six factors, then hard gates that can
//! override the tier. The scorer is a pure function of [`ScoreInputs`].

use super::{
    ConfidenceScore, Factor, FactorScore, Gate, Recommendation, ScoreInputs, Strength,
};
use crate::config::Config;
use crate::odds::VelocityStatus;
use crate::premium::BounceRisk;
use rust_decimal::Decimal;

/// Maximum score
pub const MAX_SCORE: u32 = 100;
/// Score needed for EXTREME / BUY
pub const EXTREME_SCORE: u32 = 75;
/// Score needed for MODERATE / SMALL_BET
pub const MODERATE_SCORE: u32 = 50;

/// Scorer thresholds
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Reference move (USD) in the same direction that confirms
    pub reference_confirm_usd: Decimal,
    /// Odds below this score the odds-level points
    pub good_odds: Decimal,
    /// Odds at or above this force SKIP
    pub max_buy_odds: Decimal,
    /// Liquidation estimate (USD) that earns the cascade bonus
    pub cascade_threshold_usd: Decimal,
    /// Market-local hours where everything is SKIP
    pub skip_hours: Vec<u32>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ScorerConfig {
    fn from(config: &Config) -> Self {
        Self {
            reference_confirm_usd: config.scoring.reference_confirm_usd,
            good_odds: config.scoring.good_odds,
            max_buy_odds: config.scoring.max_buy_odds,
            cascade_threshold_usd: config.liquidation.cascade_threshold_usd,
            skip_hours: config.window.skip_hours.clone(),
        }
    }
}

/// Combines market conditions into a [`ConfidenceScore`]
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    config: ScorerConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score the inputs and map them to a recommendation
    pub fn score(&self, inputs: &ScoreInputs) -> ConfidenceScore {
        let mut breakdown = Vec::new();
        let mut add = |factor: Factor, label: &str, points: u32| {
            breakdown.push(FactorScore {
                factor,
                label: label.to_string(),
                points,
            });
        };

        let atr_ratio = inputs
            .atr14
            .filter(|atr| *atr > Decimal::ZERO)
            .map(|atr| inputs.price_move.abs() / atr);

        if let Some(ratio) = atr_ratio {
            if ratio >= Decimal::ONE {
                add(Factor::MoveVsAtr, "Breakout (>1.0 ATR)", 30);
            } else if ratio >= Decimal::new(5, 1) {
                add(Factor::MoveVsAtr, "Solid Move (>0.5 ATR)", 15);
            }
        }

        if let Some(rel_vol) = inputs.relative_volume {
            if rel_vol >= Decimal::new(15, 1) {
                add(Factor::Volume, "High Volume (1.5x)", 25);
            } else if rel_vol >= Decimal::new(11, 1) {
                add(Factor::Volume, "Above-Avg Volume (1.1x)", 15);
            }
        }

        if let Some(reference_move) = inputs.reference_move {
            if reference_move * inputs.direction.sign() >= self.config.reference_confirm_usd {
                add(Factor::ReferenceConfirm, "Reference Asset Confirms", 20);
            }
        }

        if matches!(inputs.current_odds, Some(odds) if odds < self.config.good_odds) {
            add(Factor::OddsLevel, "Good Odds", 15);
        }

        if inputs.bounce_risk == Some(BounceRisk::Low) {
            add(Factor::BounceRisk, "Low Bounce Risk", 10);
        }

        if inputs.liquidation_usd >= self.config.cascade_threshold_usd {
            add(Factor::LiquidationCascade, "Liquidation Cascade", 10);
        }

        let score = breakdown
            .iter()
            .map(|f| f.points)
            .sum::<u32>()
            .min(MAX_SCORE);
        let (strength, tier) = Self::tier(score);
        let (recommendation, gate) = match self.gate(inputs) {
            Some(Gate::RapidOddsRise) if score >= MODERATE_SCORE => {
                (Recommendation::SmallBet, Some(Gate::RapidOddsRise))
            }
            Some(gate) => (Recommendation::Skip, Some(gate)),
            None => (tier, None),
        };

        ConfidenceScore {
            score,
            breakdown,
            strength,
            recommendation,
            gate,
            atr_ratio,
        }
    }

    fn tier(score: u32) -> (Strength, Recommendation) {
        if score >= EXTREME_SCORE {
            (Strength::Extreme, Recommendation::Buy)
        } else if score >= MODERATE_SCORE {
            (Strength::Moderate, Recommendation::SmallBet)
        } else {
            (Strength::Low, Recommendation::Wait)
        }
    }

    /// First hard gate that applies, in precedence order
    fn gate(&self, inputs: &ScoreInputs) -> Option<Gate> {
        if matches!(inputs.current_odds, Some(odds) if odds >= self.config.max_buy_odds) {
            return Some(Gate::OddsTooHigh);
        }
        if self.config.skip_hours.contains(&inputs.local_hour) {
            return Some(Gate::SkipHour);
        }
        if inputs.bounce_risk == Some(BounceRisk::High) {
            return Some(Gate::HighBounceRisk);
        }
        if inputs.odds_velocity == VelocityStatus::RapidRise {
            return Some(Gate::RapidOddsRise);
        }
        None
    }
}
