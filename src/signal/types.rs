//! Signal types

use crate::odds::VelocityStatus;
use crate::premium::BounceRisk;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the hour's move, and the outcome a recommendation buys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Direction of a signed move; a flat hour counts as UP
    pub fn from_move(change: Decimal) -> Self {
        if change >= Decimal::ZERO {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// +1 for UP, -1 for DOWN
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Up => Decimal::ONE,
            Direction::Down => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conviction tier derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Strength {
    Low,
    Moderate,
    Extreme,
}

impl Strength {
    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Low => "LOW",
            Strength::Moderate => "MODERATE",
            Strength::Extreme => "EXTREME",
        }
    }
}

/// Advisory action for the hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Wait,
    Skip,
    SmallBet,
    Buy,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Wait => "WAIT",
            Recommendation::Skip => "SKIP",
            Recommendation::SmallBet => "SMALL_BET",
            Recommendation::Buy => "BUY",
        }
    }

    /// Whether acting on this recommendation opens a tracked position
    pub fn opens_position(self) -> bool {
        matches!(self, Recommendation::Buy | Recommendation::SmallBet)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring factors, in breakdown order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    MoveVsAtr,
    Volume,
    ReferenceConfirm,
    OddsLevel,
    BounceRisk,
    LiquidationCascade,
}

/// One contributing line of a score breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub label: String,
    pub points: u32,
}

/// Condition that overrides the score tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Odds at or above the max-buy threshold
    OddsTooHigh,
    /// Hour is in the skip list
    SkipHour,
    /// Premium shows crowding against the direction
    HighBounceRisk,
    /// Odds moving up fast; the edge is being priced in
    RapidOddsRise,
}

impl Gate {
    pub fn describe(self) -> &'static str {
        match self {
            Gate::OddsTooHigh => "Odds too high",
            Gate::SkipHour => "Low-liquidity hour",
            Gate::HighBounceRisk => "High bounce risk",
            Gate::RapidOddsRise => "Odds rising rapidly",
        }
    }
}

/// Everything the scorer looks at, sampled at one instant
#[derive(Debug, Clone)]
pub struct ScoreInputs {
    pub direction: Direction,
    /// Signed move of the traded asset from the hour open
    pub price_move: Decimal,
    pub atr14: Option<Decimal>,
    pub relative_volume: Option<Decimal>,
    /// Signed move of the reference asset from its hour open
    pub reference_move: Option<Decimal>,
    /// Odds of the `direction` outcome
    pub current_odds: Option<Decimal>,
    pub bounce_risk: Option<BounceRisk>,
    /// Estimated liquidation volume (USD)
    pub liquidation_usd: Decimal,
    pub odds_velocity: VelocityStatus,
    /// Hour of day in the market's timezone
    pub local_hour: u32,
}

/// Result of one scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// 0..=100
    pub score: u32,
    /// Non-zero factors only, in factor order
    pub breakdown: Vec<FactorScore>,
    pub strength: Strength,
    pub recommendation: Recommendation,
    /// Gate that overrode the tier, if any
    pub gate: Option<Gate>,
    /// |move| / ATR14, when ATR is known
    pub atr_ratio: Option<Decimal>,
}

impl ConfidenceScore {
    pub fn points_for(&self, factor: Factor) -> u32 {
        self.breakdown
            .iter()
            .find(|f| f.factor == factor)
            .map(|f| f.points)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_from_move() {
        assert_eq!(Direction::from_move(dec!(14)), Direction::Up);
        assert_eq!(Direction::from_move(dec!(-0.01)), Direction::Down);
        assert_eq!(Direction::from_move(Decimal::ZERO), Direction::Up);
        assert_eq!(Direction::Down.sign(), dec!(-1));
        assert_eq!(Direction::Up.opposite(), Direction::Down);
    }

    #[test]
    fn test_recommendation_names() {
        assert_eq!(Recommendation::SmallBet.as_str(), "SMALL_BET");
        assert_eq!(
            serde_json::to_string(&Recommendation::SmallBet).unwrap(),
            "\"SMALL_BET\""
        );
        assert!(Recommendation::Buy.opens_position());
        assert!(!Recommendation::Skip.opens_position());
        assert!(!Recommendation::Wait.opens_position());
    }

    #[test]
    fn test_factor_order_is_stable() {
        let mut factors = vec![
            Factor::LiquidationCascade,
            Factor::MoveVsAtr,
            Factor::BounceRisk,
            Factor::Volume,
        ];
        factors.sort();
        assert_eq!(
            factors,
            vec![
                Factor::MoveVsAtr,
                Factor::Volume,
                Factor::BounceRisk,
                Factor::LiquidationCascade
            ]
        );
    }
}
