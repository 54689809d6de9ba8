//! Configuration loading

use poly_hourly::config::{Config, DirectionMode};
use rust_decimal_macros::dec;
use std::io::Write;

#[test]
fn test_empty_file_uses_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.feed.symbol, "ETHUSDT");
    assert_eq!(config.feed.reference_symbol, "BTCUSDT");
    assert_eq!(config.window.entry_window_start_minute, 40);
    assert_eq!(config.window.skip_hours, vec![3, 4, 5]);
    assert_eq!(config.scoring.alert_min_score, 50);
    assert_eq!(config.exit.price_reversal_usd, dec!(15));
}

#[test]
fn test_load_partial_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [feed]
        symbol = "SOLUSDT"

        [scoring]
        direction_mode = "long-only"
        max_buy_odds = 0.70

        [window]
        entry_window_start_minute = 45
        skip_hours = []

        [notify]
        webhook_url = "https://discord.example/webhook"
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.feed.symbol, "SOLUSDT");
    assert_eq!(config.feed.stale_after_secs, 30);
    assert_eq!(config.scoring.direction_mode, DirectionMode::LongOnly);
    assert_eq!(config.scoring.max_buy_odds, dec!(0.70));
    assert_eq!(config.scoring.good_odds, dec!(0.65));
    assert_eq!(config.window.entry_window_start_minute, 45);
    assert!(config.window.skip_hours.is_empty());
    assert!(config.notify.webhook_url.is_some());
}

#[test]
fn test_missing_file_errors() {
    assert!(Config::load("/nonexistent/poly-hourly.toml").is_err());
}

#[test]
fn test_example_config_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.odds.slug_prefix, "ethereum-up-or-down");
    assert_eq!(config.liquidation.cascade_threshold_usd, dec!(30000000));
    assert_eq!(config.scoring.direction_mode, DirectionMode::BinaryOutcome);
    assert!(config.notify.webhook_url.is_none());
}

#[test]
fn test_load_rejects_history_too_short_for_indicators() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[candles]\nhistory_limit = 15").unwrap();

    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("history_limit"));
}
