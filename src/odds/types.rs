//! Odds types

use crate::signal::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome price at or above which a market counts as resolved
pub const RESOLVED_PRICE: Decimal = Decimal::from_parts(99, 0, 0, false, 2);

/// Decoded prices of one hourly market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds {
    pub slug: String,
    pub up: Option<Decimal>,
    pub down: Option<Decimal>,
    pub closed: bool,
}

impl MarketOdds {
    /// Price of the outcome matching `direction`
    pub fn for_direction(&self, direction: Direction) -> Option<Decimal> {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    /// Winning outcome once one side trades at the resolution price
    pub fn resolved_winner(&self) -> Option<Direction> {
        match (self.up, self.down) {
            (Some(up), _) if up >= RESOLVED_PRICE => Some(Direction::Up),
            (_, Some(down)) if down >= RESOLVED_PRICE => Some(Direction::Down),
            _ => None,
        }
    }
}

/// One recorded odds poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsSample {
    pub timestamp: DateTime<Utc>,
    pub up: Option<Decimal>,
    pub down: Option<Decimal>,
}

impl OddsSample {
    pub fn side(&self, direction: Direction) -> Option<Decimal> {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

/// Classification of odds movement over the sample buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VelocityStatus {
    Unknown,
    InsufficientData,
    Stable,
    Rising,
    RapidRise,
    Falling,
}

impl VelocityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VelocityStatus::Unknown => "UNKNOWN",
            VelocityStatus::InsufficientData => "INSUFFICIENT_DATA",
            VelocityStatus::Stable => "STABLE",
            VelocityStatus::Rising => "RISING",
            VelocityStatus::RapidRise => "RAPID_RISE",
            VelocityStatus::Falling => "FALLING",
        }
    }
}

/// Odds rate of change per minute for one side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsVelocity {
    /// None unless status is one of the measured states
    pub per_minute: Option<Decimal>,
    pub status: VelocityStatus,
}

impl OddsVelocity {
    pub fn unmeasured(status: VelocityStatus) -> Self {
        Self {
            per_minute: None,
            status,
        }
    }
}

/// Gamma payloads that fail the decode boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("payload is not an event list")]
    NotAnEventList,
    #[error("event has no markets")]
    NoMarket,
    #[error("field {0} is missing")]
    MissingField(&'static str),
    #[error("field {field} could not be decoded: {reason}")]
    Undecodable { field: &'static str, reason: String },
    #[error("{outcomes} outcomes but {prices} prices")]
    LengthMismatch { outcomes: usize, prices: usize },
}
