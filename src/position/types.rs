//! Position types

use crate::premium::BounceRisk;
use crate::signal::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Exit warning kinds; each fires at most once per position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitKind {
    PriceReversal,
    #[serde(rename = "BTC_REVERSAL")]
    ReferenceReversal,
    PremiumFlip,
    TakeProfit,
    StopLoss,
}

impl ExitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitKind::PriceReversal => "PRICE_REVERSAL",
            ExitKind::ReferenceReversal => "BTC_REVERSAL",
            ExitKind::PremiumFlip => "PREMIUM_FLIP",
            ExitKind::TakeProfit => "TAKE_PROFIT",
            ExitKind::StopLoss => "STOP_LOSS",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ExitKind::PriceReversal => "PRICE REVERSAL WARNING",
            ExitKind::ReferenceReversal => "REFERENCE REVERSAL WARNING",
            ExitKind::PremiumFlip => "BOUNCE RISK INCREASED",
            ExitKind::TakeProfit => "TAKE PROFIT OPPORTUNITY",
            ExitKind::StopLoss => "STOP LOSS WARNING",
        }
    }
}

/// Entry snapshot handed to the monitor on registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub direction: Direction,
    pub entry_price: Decimal,
    pub entry_reference_price: Option<Decimal>,
    /// Premium percent at entry
    pub entry_premium: Option<Decimal>,
    pub entry_bounce_risk: Option<BounceRisk>,
    pub entry_odds: Option<Decimal>,
    pub entry_time: DateTime<Utc>,
    pub hour_end: DateTime<Utc>,
}

/// A tracked recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    #[serde(flatten)]
    pub entry: PositionEntry,
    /// Exit kinds already fired
    pub exits_fired: BTreeSet<ExitKind>,
}

impl Position {
    pub fn new(entry: PositionEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry,
            exits_fired: BTreeSet::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.entry.direction
    }

    pub fn has_fired(&self, kind: ExitKind) -> bool {
        self.exits_fired.contains(&kind)
    }
}

/// One exit warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAlert {
    pub kind: ExitKind,
    pub direction: Direction,
    /// Entry value of the watched quantity (price, premium or odds)
    pub entry: Option<Decimal>,
    /// Value that triggered the warning
    pub current: Decimal,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Result of a timed exit check
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// No position registered
    Idle,
    /// Hour ended; the position was dropped without an alert
    Cleared(Position),
    /// Position still open; newly fired warnings (possibly none)
    Open(Vec<ExitAlert>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_kind_names() {
        assert_eq!(ExitKind::ReferenceReversal.as_str(), "BTC_REVERSAL");
        assert_eq!(
            serde_json::to_string(&ExitKind::ReferenceReversal).unwrap(),
            "\"BTC_REVERSAL\""
        );
        assert_eq!(
            serde_json::to_string(&ExitKind::TakeProfit).unwrap(),
            "\"TAKE_PROFIT\""
        );
    }
}
