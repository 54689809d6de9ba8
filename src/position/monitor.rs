//! Exit-risk monitoring for the registered position

use super::{CheckOutcome, ExitAlert, ExitKind, Position, PositionEntry};
use crate::config::ExitConfig;
use crate::premium::{BounceRisk, PremiumAssessment};
use crate::signal::Direction;
use crate::strategy::AlertPermit;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Holds at most one position and evaluates its exit conditions
#[derive(Debug)]
pub struct PositionMonitor {
    config: ExitConfig,
    active: Option<Position>,
}

impl PositionMonitor {
    pub fn new(config: ExitConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Start monitoring a position
    ///
    /// Consumes the hour's permit, so a second registration in the same
    /// hour window cannot be expressed.
    pub fn register(&mut self, _permit: AlertPermit, entry: PositionEntry) -> &Position {
        let position = Position::new(entry);
        tracing::info!(
            id = %position.id,
            direction = %position.direction(),
            entry_price = %position.entry.entry_price,
            "Position registered"
        );
        self.active.insert(position)
    }

    pub fn active(&self) -> Option<&Position> {
        self.active.as_ref()
    }

    /// Drop the position without alerting
    pub fn clear(&mut self) -> Option<Position> {
        let cleared = self.active.take();
        if let Some(position) = &cleared {
            tracing::info!(
                id = %position.id,
                fired = position.exits_fired.len(),
                "Position cleared"
            );
        }
        cleared
    }

    /// Timed check: hour end, price and reference reversal, premium flip
    pub fn check_at(
        &mut self,
        now: DateTime<Utc>,
        price: Option<Decimal>,
        reference_price: Option<Decimal>,
        premium: Option<&PremiumAssessment>,
    ) -> CheckOutcome {
        let Some(position) = self.active.as_ref() else {
            return CheckOutcome::Idle;
        };

        if now >= position.entry.hour_end {
            return match self.clear() {
                Some(position) => CheckOutcome::Cleared(position),
                None => CheckOutcome::Idle,
            };
        }

        let mut alerts = Vec::new();
        let direction = position.direction();

        if let Some(price) = price {
            let entry = position.entry.entry_price;
            if reversed(direction, price - entry, self.config.price_reversal_usd) {
                alerts.push(ExitAlert {
                    kind: ExitKind::PriceReversal,
                    direction,
                    entry: Some(entry),
                    current: price,
                    message: format!("Price moved ${} against the position", (price - entry).abs()),
                    at: now,
                });
            }
        }

        let entry_reference = position.entry.entry_reference_price;
        if let (Some(current), Some(entry)) = (reference_price, entry_reference) {
            if reversed(direction, current - entry, self.config.reference_reversal_usd) {
                alerts.push(ExitAlert {
                    kind: ExitKind::ReferenceReversal,
                    direction,
                    entry: Some(entry),
                    current,
                    message: format!(
                        "Reference asset moved ${} against the position",
                        (current - entry).abs()
                    ),
                    at: now,
                });
            }
        }

        if let Some(premium) = premium {
            if position.entry.entry_bounce_risk == Some(BounceRisk::Low)
                && premium.bounce_risk == BounceRisk::High
            {
                alerts.push(ExitAlert {
                    kind: ExitKind::PremiumFlip,
                    direction,
                    entry: position.entry.entry_premium,
                    current: premium.premium_pct,
                    message: format!("Bounce risk LOW -> HIGH: {}", premium.analysis),
                    at: now,
                });
            }
        }

        CheckOutcome::Open(self.fire(alerts))
    }

    /// Odds check, run on every fresh odds reading for the position's side
    pub fn check_odds_at(&mut self, now: DateTime<Utc>, odds: Decimal) -> Vec<ExitAlert> {
        let Some(position) = self.active.as_ref() else {
            return Vec::new();
        };
        if now >= position.entry.hour_end {
            return Vec::new();
        }

        let direction = position.direction();
        let entry = position.entry.entry_odds;
        let mut alerts = Vec::new();

        if odds < self.config.take_profit_odds {
            alerts.push(ExitAlert {
                kind: ExitKind::TakeProfit,
                direction,
                entry,
                current: odds,
                message: format!("Odds dropped to {odds}"),
                at: now,
            });
        }
        if odds > self.config.stop_loss_odds {
            alerts.push(ExitAlert {
                kind: ExitKind::StopLoss,
                direction,
                entry,
                current: odds,
                message: format!("Odds climbed to {odds}"),
                at: now,
            });
        }

        self.fire(alerts)
    }

    /// Keep only kinds not yet fired and mark them fired
    fn fire(&mut self, candidates: Vec<ExitAlert>) -> Vec<ExitAlert> {
        let Some(position) = self.active.as_mut() else {
            return Vec::new();
        };
        candidates
            .into_iter()
            .filter(|alert| position.exits_fired.insert(alert.kind))
            .inspect(|alert| {
                tracing::warn!(
                    kind = alert.kind.as_str(),
                    current = %alert.current,
                    "Exit condition"
                );
            })
            .collect()
    }
}

/// Adverse move of at least `threshold` for the direction
fn reversed(direction: Direction, change: Decimal, threshold: Decimal) -> bool {
    match direction {
        Direction::Up => change <= -threshold,
        Direction::Down => change >= threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::HourlyStateMachine;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn hour_open() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 20, 0, 0).unwrap()
    }

    fn entry(direction: Direction) -> PositionEntry {
        PositionEntry {
            direction,
            entry_price: dec!(3014),
            entry_reference_price: Some(dec!(65000)),
            entry_premium: Some(dec!(-0.06)),
            entry_bounce_risk: Some(BounceRisk::Low),
            entry_odds: Some(dec!(0.60)),
            entry_time: hour_open() + Duration::minutes(42),
            hour_end: hour_open() + Duration::hours(1),
        }
    }

    fn registered(direction: Direction) -> PositionMonitor {
        let mut machine = HourlyStateMachine::new(40);
        machine.on_candle(hour_open(), dec!(3000), None);
        machine.tick_at(hour_open() + Duration::minutes(41));
        let permit = machine.begin_alert().unwrap();

        let mut monitor = PositionMonitor::new(ExitConfig::default());
        monitor.register(permit, entry(direction));
        monitor
    }

    fn premium(bounce_risk: BounceRisk) -> PremiumAssessment {
        PremiumAssessment {
            premium_pct: dec!(0.2),
            crowded: bounce_risk != BounceRisk::Low,
            bounce_risk,
            analysis: "longs heavily crowded, reversal likely".to_string(),
        }
    }

    fn at(minute: i64) -> DateTime<Utc> {
        hour_open() + Duration::minutes(minute)
    }

    fn kinds(outcome: &CheckOutcome) -> Vec<ExitKind> {
        match outcome {
            CheckOutcome::Open(alerts) => alerts.iter().map(|a| a.kind).collect(),
            _ => panic!("expected open position, got {outcome:?}"),
        }
    }

    #[test]
    fn test_idle_without_position() {
        let mut monitor = PositionMonitor::new(ExitConfig::default());
        assert_eq!(monitor.check_at(at(50), Some(dec!(1)), None, None), CheckOutcome::Idle);
        assert!(monitor.check_odds_at(at(50), dec!(0.1)).is_empty());
    }

    #[test]
    fn test_price_reversal_fires_once() {
        let mut monitor = registered(Direction::Up);

        let first = monitor.check_at(at(43), Some(dec!(2998)), None, None);
        assert_eq!(kinds(&first), vec![ExitKind::PriceReversal]);

        // recovers, then crosses again
        assert!(kinds(&monitor.check_at(at(44), Some(dec!(3020)), None, None)).is_empty());
        assert!(kinds(&monitor.check_at(at(45), Some(dec!(2990)), None, None)).is_empty());

        assert!(monitor.active().unwrap().has_fired(ExitKind::PriceReversal));
    }

    #[test]
    fn test_reversal_threshold_inclusive() {
        let mut monitor = registered(Direction::Up);
        assert!(kinds(&monitor.check_at(at(43), Some(dec!(3000)), None, None)).is_empty());
        assert_eq!(
            kinds(&monitor.check_at(at(44), Some(dec!(2999)), None, None)),
            vec![ExitKind::PriceReversal]
        );
    }

    #[test]
    fn test_down_position_reversal() {
        let mut monitor = registered(Direction::Down);
        // falling price is fine for DOWN
        let outcome = monitor.check_at(at(43), Some(dec!(2950)), Some(dec!(64000)), None);
        assert!(kinds(&outcome).is_empty());

        let outcome = monitor.check_at(at(44), Some(dec!(3030)), Some(dec!(65250)), None);
        assert_eq!(
            kinds(&outcome),
            vec![ExitKind::PriceReversal, ExitKind::ReferenceReversal]
        );
    }

    #[test]
    fn test_premium_flip() {
        let mut monitor = registered(Direction::Up);
        let medium = premium(BounceRisk::Medium);
        let high = premium(BounceRisk::High);
        assert!(kinds(&monitor.check_at(at(43), None, None, Some(&medium))).is_empty());
        assert_eq!(
            kinds(&monitor.check_at(at(44), None, None, Some(&high))),
            vec![ExitKind::PremiumFlip]
        );
        assert!(kinds(&monitor.check_at(at(45), None, None, Some(&high))).is_empty());
    }

    #[test]
    fn test_odds_exits() {
        let mut monitor = registered(Direction::Up);
        assert!(monitor.check_odds_at(at(43), dec!(0.50)).is_empty());
        assert!(monitor.check_odds_at(at(43), dec!(0.85)).is_empty());

        let alerts = monitor.check_odds_at(at(44), dec!(0.86));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, ExitKind::StopLoss);
        assert_eq!(alerts[0].entry, Some(dec!(0.60)));

        let alerts = monitor.check_odds_at(at(45), dec!(0.49));
        assert_eq!(alerts[0].kind, ExitKind::TakeProfit);

        assert!(monitor.check_odds_at(at(46), dec!(0.30)).is_empty());
        assert!(monitor.check_odds_at(at(46), dec!(0.95)).is_empty());
    }

    #[test]
    fn test_warnings_accumulate_until_hour_end() {
        let mut monitor = registered(Direction::Up);
        let high = premium(BounceRisk::High);
        monitor.check_at(at(43), Some(dec!(2990)), Some(dec!(64700)), Some(&high));
        monitor.check_odds_at(at(44), dec!(0.90));
        assert_eq!(monitor.active().unwrap().exits_fired.len(), 4);

        match monitor.check_at(at(60), Some(dec!(2990)), None, None) {
            CheckOutcome::Cleared(position) => assert_eq!(position.exits_fired.len(), 4),
            other => panic!("expected clear, got {other:?}"),
        }
        assert!(monitor.active().is_none());
    }
}
