//! Exit alerts for the alerted position

use crate::common::*;
use chrono::Duration;
use poly_hourly::config::Config;
use rust_decimal_macros::dec;

/// Harness with an UP position entered at 3014 / 90180 on odds 0.60
async fn with_position() -> Harness {
    let mut h = Harness::standard_hour(Config::default());
    h.strategy.refresh_candles_at(at_minute(1)).await;
    let now = at_minute(45);
    h.tick(SYMBOL, dec!(3014), now).await;
    h.tick(REFERENCE, dec!(90180), now).await;
    h.odds.set(&slug_for(hour_open()), dec!(0.60), dec!(0.40));
    h.strategy.evaluate_at(now).await;
    assert!(h.strategy.monitor().active().is_some());
    h.drain();
    h
}

#[tokio::test]
async fn test_price_reversal_fires_once() {
    let mut h = with_position().await;

    h.tick(SYMBOL, dec!(2998), at_minute(48)).await;
    h.strategy.check_position_at(at_minute(48)).await;
    h.strategy.check_position_at(at_minute(49)).await;

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].summary, "PRICE_REVERSAL | UP position");
    assert_eq!(sent[0].field_value("Entry"), Some("3014"));
    assert_eq!(sent[0].field_value("Current"), Some("2998"));
}

#[tokio::test]
async fn test_small_pullback_is_quiet() {
    let mut h = with_position().await;

    h.tick(SYMBOL, dec!(3000), at_minute(48)).await;
    h.tick(REFERENCE, dec!(90000), at_minute(48)).await;
    h.strategy.check_position_at(at_minute(48)).await;

    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_reference_reversal() {
    let mut h = with_position().await;

    h.tick(REFERENCE, dec!(89950), at_minute(50)).await;
    h.strategy.check_position_at(at_minute(50)).await;

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].summary, "BTC_REVERSAL | UP position");
}

#[tokio::test]
async fn test_premium_flip_to_high_bounce_risk() {
    let mut h = with_position().await;

    // +0.2% premium, well past the crowding threshold
    h.premium.set_mark(dec!(3006));
    // the exit check reads the cached reading, so nothing fires yet
    h.strategy.check_position_at(at_minute(49)).await;
    assert!(h.drain().is_empty());

    h.strategy.evaluate_at(at_minute(50)).await;
    h.strategy.check_position_at(at_minute(50)).await;

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].summary, "PREMIUM_FLIP | UP position");
}

#[tokio::test]
async fn test_odds_take_profit_and_stop_loss() {
    let mut h = with_position().await;
    let slug = slug_for(hour_open());

    h.odds.set(&slug, dec!(0.45), dec!(0.55));
    h.strategy.evaluate_at(at_minute(50)).await;
    h.odds.set(&slug, dec!(0.90), dec!(0.10));
    h.strategy.evaluate_at(at_minute(52)).await;
    h.strategy.evaluate_at(at_minute(53)).await;

    let summaries: Vec<String> = h.drain().into_iter().map(|n| n.summary).collect();
    assert_eq!(
        summaries,
        vec![
            "TAKE_PROFIT | UP position".to_string(),
            "STOP_LOSS | UP position".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_monitoring_stops_at_hour_end() {
    let mut h = with_position().await;

    h.tick(SYMBOL, dec!(2900), at_minute(60)).await;
    h.strategy
        .check_position_at(hour_open() + Duration::hours(1))
        .await;

    assert!(h.strategy.monitor().active().is_none());
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_price_reversal_fires_again_next_hour() {
    let mut h = with_position().await;
    h.tick(SYMBOL, dec!(2998), at_minute(48)).await;
    h.strategy.check_position_at(at_minute(48)).await;
    assert_eq!(h.drain().len(), 1);

    let next = hour_open() + Duration::hours(1);
    let next_minute = |m: i64| next + Duration::minutes(m);
    h.candles.set(SYMBOL, history(next, dec!(3000), dec!(160)));
    h.candles.set(REFERENCE, history(next, dec!(90000), dec!(10)));
    h.strategy.refresh_candles_at(next_minute(1)).await;
    assert!(h.strategy.monitor().active().is_none());

    h.tick(SYMBOL, dec!(3014), next_minute(45)).await;
    h.tick(REFERENCE, dec!(90180), next_minute(45)).await;
    h.odds.set(&slug_for(next), dec!(0.60), dec!(0.40));
    h.strategy.evaluate_at(next_minute(45)).await;
    let position = h.strategy.monitor().active().cloned();
    assert_eq!(position.map(|p| p.entry.entry_time), Some(next_minute(45)));
    h.drain();

    h.tick(SYMBOL, dec!(2998), next_minute(48)).await;
    h.strategy.check_position_at(next_minute(48)).await;

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].summary, "PRICE_REVERSAL | UP position");
}
