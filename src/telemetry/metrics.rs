//! Prometheus metrics
//!
//! Thin wrappers over the `metrics` facade so call sites name what they
//! measure instead of repeating metric keys.

use crate::position::ExitKind;
use crate::signal::Recommendation;
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::net::SocketAddr;

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Last confidence score
    Score,
    /// Current odds for the evaluated direction
    CurrentOdds,
    /// Futures premium percent
    PremiumPct,
    /// Odds change per minute
    OddsVelocity,
    /// Seconds since the last traded price
    PriceAgeSecs,
}

/// Upstream sources whose failures are counted
#[derive(Debug, Clone, Copy)]
pub enum FetchSource {
    Candles,
    Odds,
    Premium,
    Liquidation,
    Notify,
}

impl FetchSource {
    fn as_str(&self) -> &'static str {
        match self {
            FetchSource::Candles => "candles",
            FetchSource::Odds => "odds",
            FetchSource::Premium => "premium",
            FetchSource::Liquidation => "liquidation",
            FetchSource::Notify => "notify",
        }
    }
}

/// Install the Prometheus exporter on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;
    tracing::info!(%addr, "Prometheus metrics listener started");
    Ok(())
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: Decimal) {
    let metric_name = match metric {
        GaugeMetric::Score => "polyhourly_score",
        GaugeMetric::CurrentOdds => "polyhourly_current_odds",
        GaugeMetric::PremiumPct => "polyhourly_premium_pct",
        GaugeMetric::OddsVelocity => "polyhourly_odds_velocity_per_min",
        GaugeMetric::PriceAgeSecs => "polyhourly_price_age_secs",
    };

    metrics::gauge!(metric_name).set(value.to_f64().unwrap_or_default());
}

/// Count an emitted hourly alert
pub fn record_alert(recommendation: Recommendation) {
    metrics::counter!("polyhourly_alerts_total", "recommendation" => recommendation.as_str())
        .increment(1);
}

/// Count an emitted exit warning
pub fn record_exit_alert(kind: ExitKind) {
    metrics::counter!("polyhourly_exit_alerts_total", "kind" => kind.as_str()).increment(1);
}

/// Count a failed upstream call
pub fn record_fetch_failure(source: FetchSource) {
    metrics::counter!("polyhourly_fetch_failures_total", "source" => source.as_str()).increment(1);
}

/// Count an hour window rollover
pub fn record_rollover() {
    metrics::counter!("polyhourly_hour_rollovers_total").increment(1);
}
