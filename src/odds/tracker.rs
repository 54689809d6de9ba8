//! Rolling odds history and velocity

use super::{OddsSample, OddsVelocity, VelocityStatus};
use crate::config::OddsConfig;
use crate::signal::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Bounded, per-hour buffer of odds samples
#[derive(Debug, Clone)]
pub struct OddsTracker {
    samples: VecDeque<OddsSample>,
    capacity: usize,
    rising: Decimal,
    rapid: Decimal,
    min_minutes: Decimal,
}

impl OddsTracker {
    pub fn new(config: &OddsConfig) -> Self {
        let capacity = config.history_capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            rising: config.velocity_rising,
            rapid: config.velocity_rapid,
            min_minutes: config.min_velocity_minutes,
        }
    }

    /// Append a sample taken now
    pub fn record_sample(&mut self, up: Option<Decimal>, down: Option<Decimal>) {
        self.record_sample_at(Utc::now(), up, down);
    }

    /// Append a sample, evicting the oldest once over capacity
    pub fn record_sample_at(
        &mut self,
        at: DateTime<Utc>,
        up: Option<Decimal>,
        down: Option<Decimal>,
    ) {
        self.samples.push_back(OddsSample {
            timestamp: at,
            up,
            down,
        });
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Velocity of one side between the oldest and newest sample
    pub fn velocity(&self, direction: Direction) -> OddsVelocity {
        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return OddsVelocity::unmeasured(VelocityStatus::Unknown);
        };
        if self.samples.len() < 2 {
            return OddsVelocity::unmeasured(VelocityStatus::Unknown);
        }

        let (Some(first), Some(last)) = (oldest.side(direction), newest.side(direction)) else {
            return OddsVelocity::unmeasured(VelocityStatus::Unknown);
        };

        let elapsed_ms = (newest.timestamp - oldest.timestamp).num_milliseconds();
        let elapsed_minutes = Decimal::from(elapsed_ms) / Decimal::from(MILLIS_PER_MINUTE);
        if elapsed_minutes < self.min_minutes || elapsed_minutes <= Decimal::ZERO {
            return OddsVelocity::unmeasured(VelocityStatus::InsufficientData);
        }

        let per_minute = (last - first) / elapsed_minutes;
        let status = if per_minute >= self.rapid {
            VelocityStatus::RapidRise
        } else if per_minute >= self.rising {
            VelocityStatus::Rising
        } else if per_minute <= -self.rising {
            VelocityStatus::Falling
        } else {
            VelocityStatus::Stable
        };

        OddsVelocity {
            per_minute: Some(per_minute),
            status,
        }
    }

    /// Forget all samples; velocity never spans two hours
    pub fn reset_on_new_hour(&mut self) {
        self.samples.clear();
    }

    pub fn latest(&self) -> Option<&OddsSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
