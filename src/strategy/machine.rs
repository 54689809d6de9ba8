//! Hourly alert gating

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One trading hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourWindow {
    pub open_time: DateTime<Utc>,
    pub open_price: Decimal,
    /// Reference asset's open for the same hour, if known
    pub reference_open: Option<Decimal>,
    pub close_time: DateTime<Utc>,
}

impl HourWindow {
    pub fn new(
        open_time: DateTime<Utc>,
        open_price: Decimal,
        reference_open: Option<Decimal>,
    ) -> Self {
        Self {
            open_time,
            open_price,
            reference_open,
            close_time: open_time + Duration::hours(1),
        }
    }

    /// Whole minutes since the open
    pub fn minute_of_hour(&self, now: DateTime<Utc>) -> i64 {
        (now - self.open_time).num_minutes()
    }

    /// Whole minutes until the close, never negative
    pub fn minutes_left(&self, now: DateTime<Utc>) -> i64 {
        (self.close_time - now).num_minutes().max(0)
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.open_time && now < self.close_time
    }
}

/// Gating state within the current hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Before the entry window
    Waiting,
    /// Entry window open, no alert yet
    InWindow,
    /// This hour's alert has been sent
    Alerted,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Waiting => "WAITING",
            Phase::InWindow => "IN_WINDOW",
            Phase::Alerted => "ALERTED",
        }
    }
}

/// Proof that this hour's single alert was claimed
///
/// Only [`HourlyStateMachine::begin_alert`] creates one, at most once per
/// hour window. Position registration consumes it.
#[derive(Debug)]
pub struct AlertPermit {
    hour_open: DateTime<Utc>,
}

impl AlertPermit {
    pub fn hour_open(&self) -> DateTime<Utc> {
        self.hour_open
    }
}

/// Outcome of feeding the latest in-progress candle
#[derive(Debug, Clone, PartialEq)]
pub enum WindowChange {
    /// Same hour as before
    Unchanged,
    /// First window since startup
    Started(HourWindow),
    /// A new hour replaced `previous`
    Rolled {
        previous: HourWindow,
        current: HourWindow,
    },
}

/// WAITING -> IN_WINDOW -> ALERTED, reset on every new hour
#[derive(Debug, Clone)]
pub struct HourlyStateMachine {
    entry_start_minute: i64,
    window: Option<HourWindow>,
    phase: Phase,
}

impl HourlyStateMachine {
    pub fn new(entry_start_minute: u32) -> Self {
        Self {
            entry_start_minute: i64::from(entry_start_minute.min(59)),
            window: None,
            phase: Phase::Waiting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn window(&self) -> Option<&HourWindow> {
        self.window.as_ref()
    }

    /// Feed the open of the in-progress bar; a later open time starts a new hour
    pub fn on_candle(
        &mut self,
        open_time: DateTime<Utc>,
        open_price: Decimal,
        reference_open: Option<Decimal>,
    ) -> WindowChange {
        match self.window.as_mut() {
            Some(window) if open_time == window.open_time => {
                if window.reference_open.is_none() {
                    window.reference_open = reference_open;
                }
                WindowChange::Unchanged
            }
            Some(window) if open_time < window.open_time => {
                tracing::debug!(%open_time, current = %window.open_time, "Ignoring stale candle");
                WindowChange::Unchanged
            }
            Some(window) => {
                let previous = *window;
                let current = HourWindow::new(open_time, open_price, reference_open);
                self.window = Some(current);
                self.phase = Phase::Waiting;
                tracing::info!(open = %current.open_time, %open_price, "Hour rollover");
                WindowChange::Rolled { previous, current }
            }
            None => {
                let current = HourWindow::new(open_time, open_price, reference_open);
                self.window = Some(current);
                self.phase = Phase::Waiting;
                tracing::info!(open = %current.open_time, %open_price, "Tracking hour");
                WindowChange::Started(current)
            }
        }
    }

    /// Advance on the clock
    ///
    /// Opens the entry window once the configured minute is reached, and
    /// closes an unused window when the hour runs out.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Phase {
        let Some(window) = self.window else {
            return self.phase;
        };

        match self.phase {
            Phase::Waiting
                if window.contains(now) && window.minute_of_hour(now) >= self.entry_start_minute =>
            {
                tracing::info!(minute = window.minute_of_hour(now), "Entry window open");
                self.phase = Phase::InWindow;
            }
            Phase::InWindow if !window.contains(now) => {
                tracing::info!("Hour ended without an alert");
                self.phase = Phase::Waiting;
            }
            _ => {}
        }
        self.phase
    }

    /// Claim the hour's alert; `None` unless the entry window is open
    pub fn begin_alert(&mut self) -> Option<AlertPermit> {
        if self.phase != Phase::InWindow {
            return None;
        }
        let window = self.window?;
        self.phase = Phase::Alerted;
        Some(AlertPermit {
            hour_open: window.open_time,
        })
    }
}
