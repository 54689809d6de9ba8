//! Hour lifecycle: window, scoring, single alert, rollover

use crate::common::*;
use chrono::Duration;
use poly_hourly::config::{Config, DirectionMode};
use poly_hourly::signal::{Direction, Gate, Recommendation};
use poly_hourly::strategy::Phase;
use rust_decimal_macros::dec;

/// Price +14 on ATR 10, reference +180, odds 0.60, neutral premium
async fn strong_up(harness: &mut Harness, minute: i64) {
    let now = at_minute(minute);
    harness.tick(SYMBOL, dec!(3014), now).await;
    harness.tick(REFERENCE, dec!(90180), now).await;
    harness.odds.set(&slug_for(hour_open()), dec!(0.60), dec!(0.40));
}

#[tokio::test]
async fn test_no_alert_before_entry_window() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    strong_up(&mut h, 30).await;

    h.strategy.evaluate_at(at_minute(30)).await;

    assert_eq!(h.strategy.phase(), Phase::Waiting);
    assert!(h.strategy.last_score().is_none());
    assert!(h.drain().is_empty());
    // Odds are still sampled outside the window
    assert_eq!(h.strategy.odds_tracker().len(), 1);
}

#[tokio::test]
async fn test_full_score_alerts_buy_and_opens_position() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    strong_up(&mut h, 45).await;

    h.strategy.evaluate_at(at_minute(45)).await;

    assert_eq!(h.strategy.phase(), Phase::Alerted);
    let score = h.strategy.last_score().unwrap();
    assert_eq!(score.score, 100);
    assert_eq!(score.recommendation, Recommendation::Buy);

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "BUY UP");
    assert_eq!(sent[0].field_value("Time Left"), Some("15m"));
    assert_eq!(h.journal_len(), 1);

    let position = h.strategy.monitor().active().unwrap();
    assert_eq!(position.direction(), Direction::Up);
    assert_eq!(position.entry.entry_price, dec!(3014));
    assert_eq!(position.entry.entry_reference_price, Some(dec!(90180)));
    assert_eq!(position.entry.entry_odds, Some(dec!(0.60)));
    assert_eq!(position.entry.hour_end, hour_open() + Duration::hours(1));
}

#[tokio::test]
async fn test_exactly_one_alert_per_hour() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;

    for minute in [41, 45, 50, 55, 59] {
        strong_up(&mut h, minute).await;
        h.strategy.evaluate_at(at_minute(minute)).await;
    }

    assert_eq!(h.drain().len(), 1);
    assert_eq!(h.journal_len(), 1);
    assert_eq!(h.strategy.phase(), Phase::Alerted);
}

#[tokio::test]
async fn test_expensive_odds_skip_but_still_alert() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    strong_up(&mut h, 45).await;
    h.odds.set(&slug_for(hour_open()), dec!(0.80), dec!(0.20));

    h.strategy.evaluate_at(at_minute(45)).await;

    let score = h.strategy.last_score().unwrap();
    assert_eq!(score.score, 85);
    assert_eq!(score.recommendation, Recommendation::Skip);
    assert_eq!(score.gate, Some(Gate::OddsTooHigh));

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "SKIP UP");
    assert!(h.strategy.monitor().active().is_none());
}

#[tokio::test]
async fn test_weak_move_waits_without_alert() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    let now = at_minute(45);
    h.tick(SYMBOL, dec!(3002), now).await;
    h.tick(REFERENCE, dec!(90010), now).await;
    h.odds.set(&slug_for(hour_open()), dec!(0.70), dec!(0.30));

    h.strategy.evaluate_at(now).await;

    // Volume 25 + low bounce risk 10
    let score = h.strategy.last_score().unwrap();
    assert_eq!(score.score, 35);
    assert_eq!(score.recommendation, Recommendation::Wait);
    assert_eq!(h.strategy.phase(), Phase::InWindow);
    assert!(h.drain().is_empty());
    assert_eq!(h.journal_len(), 0);
}

#[tokio::test]
async fn test_stale_price_skips_evaluation() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    strong_up(&mut h, 2).await;

    h.strategy.evaluate_at(at_minute(45)).await;

    assert!(h.strategy.last_score().is_none());
    assert_eq!(h.strategy.phase(), Phase::InWindow);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_long_only_down_alert_opens_nothing() {
    let mut config = Config::default();
    config.scoring.direction_mode = DirectionMode::LongOnly;
    let mut h = Harness::standard_hour(config);
    h.strategy.refresh_candles_at(at_minute(1)).await;

    let now = at_minute(45);
    h.tick(SYMBOL, dec!(2986), now).await;
    h.tick(REFERENCE, dec!(89820), now).await;
    h.odds.set(&slug_for(hour_open()), dec!(0.40), dec!(0.60));

    h.strategy.evaluate_at(now).await;

    let score = h.strategy.last_score().unwrap();
    assert_eq!(score.score, 100);
    assert_eq!(score.recommendation, Recommendation::Buy);
    assert_eq!(h.drain()[0].title, "BUY DOWN");
    assert!(h.strategy.monitor().active().is_none());
}

#[tokio::test]
async fn test_rollover_resets_hour_state() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    strong_up(&mut h, 45).await;
    h.strategy.evaluate_at(at_minute(45)).await;
    assert!(h.strategy.monitor().active().is_some());
    h.drain();

    // Previous market resolves UP, next hour opens at 3020
    h.odds.set(&slug_for(hour_open()), dec!(0.995), dec!(0.005));
    let next = hour_open() + Duration::hours(1);
    h.candles.set(SYMBOL, history(next, dec!(3020), dec!(50)));
    h.candles.set(REFERENCE, history(next, dec!(90200), dec!(10)));

    h.strategy.refresh_candles_at(next + Duration::minutes(1)).await;

    assert_eq!(h.strategy.phase(), Phase::Waiting);
    assert!(h.strategy.odds_tracker().is_empty());
    assert!(h.strategy.monitor().active().is_none());
    assert!(h.strategy.last_score().is_none());

    let window = h.strategy.window().unwrap();
    assert_eq!(window.open_time, next);
    assert_eq!(window.open_price, dec!(3020));
    assert_eq!(window.reference_open, Some(dec!(90200)));

    let sent = h.drain();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].summary.contains("signal correct"));
    assert_eq!(sent[1].title, "NEW HOUR");
    assert_eq!(sent[1].field_value("Market"), Some(slug_for(next).as_str()));
}

#[tokio::test]
async fn test_new_hour_allows_a_fresh_alert() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    strong_up(&mut h, 45).await;
    h.strategy.evaluate_at(at_minute(45)).await;

    let next = hour_open() + Duration::hours(1);
    h.candles.set(SYMBOL, history(next, dec!(3000), dec!(160)));
    h.candles.set(REFERENCE, history(next, dec!(90000), dec!(10)));
    h.strategy.refresh_candles_at(next + Duration::minutes(1)).await;
    h.drain();

    let now = next + Duration::minutes(45);
    h.tick(SYMBOL, dec!(3014), now).await;
    h.tick(REFERENCE, dec!(90180), now).await;
    h.odds.set(&slug_for(next), dec!(0.60), dec!(0.40));
    h.strategy.evaluate_at(now).await;

    assert_eq!(h.drain().len(), 1);
    assert_eq!(h.journal_len(), 2);
}

#[tokio::test]
async fn test_rapid_odds_rise_downgrades_to_small_bet() {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    let slug = slug_for(hour_open());

    h.odds.set(&slug, dec!(0.45), dec!(0.55));
    h.strategy.evaluate_at(at_minute(35)).await;
    h.odds.set(&slug, dec!(0.52), dec!(0.48));
    h.strategy.evaluate_at(at_minute(38)).await;

    // 0.45 -> 0.60 over six minutes
    strong_up(&mut h, 41).await;
    h.strategy.evaluate_at(at_minute(41)).await;

    let score = h.strategy.last_score().unwrap();
    assert_eq!(score.score, 100);
    assert_eq!(score.recommendation, Recommendation::SmallBet);
    assert_eq!(score.gate, Some(Gate::RapidOddsRise));
    assert_eq!(h.drain()[0].title, "SMALL_BET UP");
    assert!(h.strategy.monitor().active().is_some());
}
