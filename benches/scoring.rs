//! Benchmarks for the evaluation hot path

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use poly_hourly::feed::Candle;
use poly_hourly::indicator::IndicatorEngine;
use poly_hourly::odds::VelocityStatus;
use poly_hourly::premium::BounceRisk;
use poly_hourly::signal::{ConfidenceScorer, Direction, ScoreInputs, ScorerConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn benchmark_score(c: &mut Criterion) {
    let scorer = ConfidenceScorer::new(ScorerConfig::default());

    let inputs = ScoreInputs {
        direction: Direction::Up,
        price_move: dec!(14),
        atr14: Some(dec!(10)),
        relative_volume: Some(dec!(1.6)),
        reference_move: Some(dec!(180)),
        current_odds: Some(dec!(0.60)),
        bounce_risk: Some(BounceRisk::Low),
        liquidation_usd: Decimal::ZERO,
        odds_velocity: VelocityStatus::Stable,
        local_hour: 15,
    };

    c.bench_function("confidence_score", |b| {
        b.iter(|| scorer.score(black_box(&inputs)))
    });
}

fn benchmark_indicators(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap();
    let bars: Vec<Candle> = (0..21i64)
        .map(|i| {
            let open = dec!(3000) + Decimal::from(i);
            Candle {
                open_time: start + Duration::hours(i),
                open,
                high: open + dec!(8),
                low: open - dec!(6),
                close: open + dec!(1),
                volume: dec!(1000) + Decimal::from(i * 10),
            }
        })
        .collect();

    c.bench_function("indicator_snapshot", |b| {
        b.iter(|| IndicatorEngine::compute(black_box(&bars)))
    });
}

criterion_group!(benches, benchmark_score, benchmark_indicators);
criterion_main!(benches);
