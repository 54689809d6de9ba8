//! Hourly strategy owner and its cooperative scheduler
//!
//! A single task owns every piece of mutable state. Each named periodic
//! task runs to completion inside the select loop, so a pass always sees
//! the results of fully finished fetches and never a half-written update.
//!
//! The exit check does no I/O. It reads prices from the [`PriceCache`] and
//! the premium reading the evaluation pass last stored, so a due check
//! waits for at most one in-flight task, which the request timeouts bound.
//! While a position is open the evaluation pass keeps that reading fresh.

use super::tasks::{ActiveTasks, TaskCommand, TaskKind};
use super::{AlertPermit, HourWindow, HourlyStateMachine, Phase, StatusSnapshot, WindowChange};
use crate::config::{Config, DirectionMode, MIN_HISTORY_LIMIT};
use crate::feed::{CandleSource, PriceCache};
use crate::indicator::{IndicatorEngine, IndicatorSnapshot};
use crate::journal::{SignalLog, SignalRecord};
use crate::liquidation::LiquidationSource;
use crate::notify::{self, Notification, SignalAlert};
use crate::odds::{local_hour, market_slug, parse_timezone, MarketOdds, OddsSource, OddsTracker};
use crate::position::{CheckOutcome, ExitAlert, PositionEntry, PositionMonitor};
use crate::premium::{PremiumAnalyzer, PremiumAssessment, PremiumReading, PremiumSource};
use crate::signal::{
    ConfidenceScore, ConfidenceScorer, Direction, Recommendation, ScoreInputs, ScorerConfig,
};
use crate::telemetry::{
    record_alert, record_exit_alert, record_fetch_failure, record_rollover, set_gauge,
    FetchSource, GaugeMetric,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;

/// External collaborators the strategy reads from and writes to
#[derive(Clone)]
pub struct Sources {
    pub candles: Arc<dyn CandleSource>,
    pub odds: Arc<dyn OddsSource>,
    pub premium: Arc<dyn PremiumSource>,
    pub liquidations: Arc<dyn LiquidationSource>,
    pub journal: Arc<dyn SignalLog>,
}

/// The hour's alert, kept for the resolution summary
#[derive(Debug, Clone)]
struct AlertRecord {
    direction: Direction,
    recommendation: Recommendation,
}

/// Owns all per-hour state and drives the periodic tasks
pub struct HourlyStrategy {
    config: Config,
    tz: Tz,
    sources: Sources,
    prices: Arc<PriceCache>,
    notifications: mpsc::Sender<Notification>,
    status: watch::Sender<StatusSnapshot>,

    machine: HourlyStateMachine,
    odds: OddsTracker,
    monitor: PositionMonitor,
    scorer: ConfidenceScorer,
    analyzer: PremiumAnalyzer,

    indicators: Option<IndicatorSnapshot>,
    current_volume: Option<Decimal>,
    last_odds: Option<MarketOdds>,
    last_premium: Option<PremiumReading>,
    last_score: Option<ConfidenceScore>,
    last_alert: Option<AlertRecord>,
}

impl HourlyStrategy {
    /// Build the strategy; returns it with a receiver for status snapshots
    pub fn new(
        config: Config,
        sources: Sources,
        prices: Arc<PriceCache>,
        notifications: mpsc::Sender<Notification>,
    ) -> anyhow::Result<(Self, watch::Receiver<StatusSnapshot>)> {
        let tz = parse_timezone(&config.odds.timezone)?;
        let (status, status_rx) = watch::channel(StatusSnapshot::empty(Utc::now()));

        let strategy = Self {
            tz,
            sources,
            prices,
            notifications,
            status,
            machine: HourlyStateMachine::new(config.window.entry_window_start_minute),
            odds: OddsTracker::new(&config.odds),
            monitor: PositionMonitor::new(config.exit.clone()),
            scorer: ConfidenceScorer::new(ScorerConfig::from(&config)),
            analyzer: PremiumAnalyzer::new(&config.premium),
            indicators: None,
            current_volume: None,
            last_odds: None,
            last_premium: None,
            last_score: None,
            last_alert: None,
            config,
        };
        Ok((strategy, status_rx))
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn window(&self) -> Option<&HourWindow> {
        self.machine.window()
    }

    pub fn odds_tracker(&self) -> &OddsTracker {
        &self.odds
    }

    pub fn monitor(&self) -> &PositionMonitor {
        &self.monitor
    }

    pub fn last_score(&self) -> Option<&ConfidenceScore> {
        self.last_score.as_ref()
    }

    /// Run the periodic tasks until `shutdown` fires
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
        mut control: mpsc::Receiver<TaskCommand>,
    ) {
        let mut candles = tokio::time::interval(self.config.candles.refresh_interval());
        let mut evaluate = tokio::time::interval(self.config.window.evaluate_interval());
        let mut position = tokio::time::interval(self.config.exit.check_interval());
        let mut status = tokio::time::interval(self.config.window.status_interval());
        for timer in [&mut candles, &mut evaluate, &mut position, &mut status] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        // commands queued before start apply ahead of the first ticks
        let mut active = ActiveTasks::default();
        while let Ok(command) = control.try_recv() {
            active.apply(command);
        }
        tracing::info!(symbol = %self.config.feed.symbol, "Hourly strategy started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Hourly strategy shutting down");
                    break;
                }
                Some(command) = control.recv() => active.apply(command),
                _ = candles.tick(), if active.is_enabled(TaskKind::CandleRefresh) => {
                    self.refresh_candles_at(Utc::now()).await;
                }
                _ = evaluate.tick(), if active.is_enabled(TaskKind::Evaluate) => {
                    self.evaluate_at(Utc::now()).await;
                }
                _ = position.tick(), if active.is_enabled(TaskKind::PositionCheck) => {
                    self.check_position_at(Utc::now()).await;
                }
                _ = status.tick(), if active.is_enabled(TaskKind::StatusReport) => {
                    self.report_status_at(Utc::now()).await;
                }
            }
        }
    }

    /// Candle refresh: indicators, hour open, rollover detection
    pub async fn refresh_candles_at(&mut self, now: DateTime<Utc>) {
        let symbol = self.config.feed.symbol.clone();
        let limit = self.config.candles.history_limit.max(MIN_HISTORY_LIMIT);

        let bars = match self
            .sources
            .candles
            .candles(&symbol, &self.config.candles.interval, limit)
            .await
        {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Candle refresh failed");
                record_fetch_failure(FetchSource::Candles);
                return;
            }
        };

        let Some((current, completed)) = bars.split_last() else {
            tracing::warn!(symbol = %symbol, "Candle source returned no bars");
            return;
        };

        self.indicators = IndicatorEngine::compute(completed);
        self.current_volume = Some(current.volume);
        if self.indicators.is_none() {
            tracing::debug!(bars = completed.len(), "Not enough history for indicators");
        }

        let reference_open = self.reference_open(current.open_time).await;
        match self.machine.on_candle(current.open_time, current.open, reference_open) {
            WindowChange::Rolled { previous, current } => self.on_rollover(previous, current).await,
            WindowChange::Started(window) => {
                tracing::info!(slug = %self.slug_for(window.open_time), "Monitoring hour");
            }
            WindowChange::Unchanged => {}
        }

        self.publish(now).await;
    }

    /// Reference asset's open for the hour starting at `open_time`
    async fn reference_open(&self, open_time: DateTime<Utc>) -> Option<Decimal> {
        if let Some(known) = self
            .machine
            .window()
            .filter(|w| w.open_time == open_time)
            .and_then(|w| w.reference_open)
        {
            return Some(known);
        }

        let symbol = &self.config.feed.reference_symbol;
        match self
            .sources
            .candles
            .candles(symbol, &self.config.candles.interval, 1)
            .await
        {
            Ok(bars) => bars
                .last()
                .filter(|bar| bar.open_time == open_time)
                .map(|bar| bar.open),
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Reference candle fetch failed");
                record_fetch_failure(FetchSource::Candles);
                None
            }
        }
    }

    async fn on_rollover(&mut self, previous: HourWindow, current: HourWindow) {
        record_rollover();
        self.odds.reset_on_new_hour();
        self.monitor.clear();
        self.last_odds = None;
        self.last_score = None;
        let prior_alert = self.last_alert.take();

        let previous_slug = self.slug_for(previous.open_time);
        match self.sources.odds.market_odds(&previous_slug).await {
            Ok(Some(odds)) => match odds.resolved_winner() {
                Some(winner) => {
                    tracing::info!(slug = %previous_slug, %winner, "Previous hour resolved");
                    self.queue(notify::resolution(
                        &previous_slug,
                        winner,
                        prior_alert.map(|a| (a.direction, a.recommendation)),
                    ));
                }
                None => tracing::debug!(slug = %previous_slug, "Previous hour not resolved yet"),
            },
            Ok(None) => tracing::debug!(slug = %previous_slug, "Previous market not found"),
            Err(e) => {
                tracing::warn!(slug = %previous_slug, error = %e, "Resolution lookup failed");
                record_fetch_failure(FetchSource::Odds);
            }
        }

        let slug = self.slug_for(current.open_time);
        self.queue(notify::new_hour(&self.config.feed.symbol, &slug, current.open_price));
    }

    /// Evaluation pass: odds, then premium, then score
    pub async fn evaluate_at(&mut self, now: DateTime<Utc>) {
        let phase = self.machine.tick_at(now);
        let Some(window) = self.machine.window().copied() else {
            tracing::debug!("No hour window yet");
            return;
        };

        let slug = self.slug_for(window.open_time);
        self.refresh_odds(&slug, now).await;

        if phase != Phase::InWindow {
            if self.monitor.active().is_some() {
                self.refresh_premium().await;
            }
            self.publish(now).await;
            return;
        }

        let symbol = self.config.feed.symbol.clone();
        let Some(price) = self.prices.price(&symbol).await else {
            tracing::debug!(symbol = %symbol, "No price yet");
            return;
        };
        if !self.price_fresh(&symbol, now).await {
            tracing::warn!(symbol = %symbol, "Price is stale, skipping evaluation");
            self.publish(now).await;
            return;
        }

        let price_move = price - window.open_price;
        let direction = Direction::from_move(price_move);

        let premium = self.refresh_premium().await;
        let assessment = premium.and_then(|r| self.analyzer.assess(&r, direction));
        let liquidation = if self.config.liquidation.enabled {
            self.sources.liquidations.liquidations(&symbol).await
        } else {
            Default::default()
        };

        let inputs = ScoreInputs {
            direction,
            price_move,
            atr14: self.indicators.map(|i| i.atr14),
            relative_volume: self
                .indicators
                .zip(self.current_volume)
                .and_then(|(i, volume)| i.relative_volume(volume)),
            reference_move: self.reference_move(&window).await,
            current_odds: self.last_odds.as_ref().and_then(|o| o.for_direction(direction)),
            bounce_risk: assessment.as_ref().map(|a| a.bounce_risk),
            liquidation_usd: liquidation.total_usd,
            odds_velocity: self.odds.velocity(direction).status,
            local_hour: local_hour(self.tz, now),
        };

        let score = self.scorer.score(&inputs);
        set_gauge(GaugeMetric::Score, Decimal::from(score.score));
        tracing::debug!(
            score = score.score,
            recommendation = score.recommendation.as_str(),
            %direction,
            %price_move,
            "Evaluated"
        );

        if score.score >= self.config.scoring.alert_min_score {
            if let Some(permit) = self.machine.begin_alert() {
                let premium = assessment.as_ref();
                self.emit_alert(permit, now, &window, price, &inputs, &score, premium, &slug)
                    .await;
            }
        }

        self.last_score = Some(score);
        self.publish(now).await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn emit_alert(
        &mut self,
        permit: AlertPermit,
        now: DateTime<Utc>,
        window: &HourWindow,
        price: Decimal,
        inputs: &ScoreInputs,
        score: &ConfidenceScore,
        assessment: Option<&PremiumAssessment>,
        slug: &str,
    ) {
        let recommendation = score.recommendation;
        tracing::info!(
            score = score.score,
            recommendation = recommendation.as_str(),
            direction = %inputs.direction,
            %price,
            "Hourly alert"
        );
        record_alert(recommendation);

        self.queue(notify::signal_alert(&SignalAlert {
            symbol: &self.config.feed.symbol,
            direction: inputs.direction,
            price,
            price_move: inputs.price_move,
            score,
            odds: inputs.current_odds,
            velocity: self.odds.velocity(inputs.direction),
            relative_volume: inputs.relative_volume,
            reference_move: inputs.reference_move,
            premium: assessment,
            liquidation_usd: inputs.liquidation_usd,
            minutes_left: window.minutes_left(now),
            slug,
        }));

        let record = SignalRecord::new(
            now,
            window.open_time,
            inputs.direction,
            price,
            inputs.price_move,
            score,
            inputs.current_odds,
            inputs.bounce_risk,
        );
        if let Err(e) = self.sources.journal.append(&record).await {
            tracing::warn!(error = %e, "Failed to journal signal");
        }

        self.last_alert = Some(AlertRecord {
            direction: inputs.direction,
            recommendation,
        });

        let long_only_down = self.config.scoring.direction_mode == DirectionMode::LongOnly
            && inputs.direction == Direction::Down;
        if !recommendation.opens_position() || long_only_down {
            tracing::debug!(
                recommendation = recommendation.as_str(),
                "Alert does not open a position"
            );
            return;
        }

        let entry = PositionEntry {
            direction: inputs.direction,
            entry_price: price,
            entry_reference_price: self.prices.price(&self.config.feed.reference_symbol).await,
            entry_premium: assessment.map(|a| a.premium_pct),
            entry_bounce_risk: inputs.bounce_risk,
            entry_odds: inputs.current_odds,
            entry_time: now,
            hour_end: window.close_time,
        };
        self.monitor.register(permit, entry);
    }

    /// Odds poll for the current hour, without scoring
    pub async fn refresh_market_at(&mut self, now: DateTime<Utc>) {
        let Some(window) = self.machine.window().copied() else {
            return;
        };
        let slug = self.slug_for(window.open_time);
        self.refresh_odds(&slug, now).await;
        self.publish(now).await;
    }

    /// Exit check for the registered position, from cached readings only
    pub async fn check_position_at(&mut self, now: DateTime<Utc>) {
        let Some(direction) = self.monitor.active().map(|p| p.direction()) else {
            return;
        };

        let price = self.prices.price(&self.config.feed.symbol).await;
        let reference_price = self.prices.price(&self.config.feed.reference_symbol).await;
        let assessment = self
            .last_premium
            .and_then(|r| self.analyzer.assess(&r, direction));

        match self.monitor.check_at(now, price, reference_price, assessment.as_ref()) {
            CheckOutcome::Idle => {}
            CheckOutcome::Cleared(position) => {
                tracing::info!(id = %position.id, "Hour ended, position monitoring stopped");
            }
            CheckOutcome::Open(alerts) => self.send_exit_alerts(alerts),
        }
        self.publish(now).await;
    }

    /// Log the status line
    pub async fn report_status_at(&mut self, now: DateTime<Utc>) {
        let snapshot = self.snapshot(now).await;
        if let Some(age) = self.prices.age_at(&self.config.feed.symbol, now).await {
            set_gauge(GaugeMetric::PriceAgeSecs, Decimal::from(age.num_seconds()));
        }
        tracing::info!("{}", snapshot.status_line());
        self.status.send_replace(snapshot);
    }

    async fn refresh_odds(&mut self, slug: &str, now: DateTime<Utc>) {
        match self.sources.odds.market_odds(slug).await {
            Ok(Some(odds)) => {
                self.odds.record_sample_at(now, odds.up, odds.down);

                if let Some(direction) = self.monitor.active().map(|p| p.direction()) {
                    if let Some(current) = odds.for_direction(direction) {
                        set_gauge(GaugeMetric::CurrentOdds, current);
                        let alerts = self.monitor.check_odds_at(now, current);
                        self.send_exit_alerts(alerts);
                    }
                }
                self.last_odds = Some(odds);
            }
            Ok(None) => tracing::debug!(slug, "Market not listed"),
            Err(e) => {
                tracing::warn!(slug, error = %e, "Odds fetch failed");
                record_fetch_failure(FetchSource::Odds);
            }
        }
    }

    /// Latest premium reading, falling back to the last good one
    async fn refresh_premium(&mut self) -> Option<PremiumReading> {
        match self.sources.premium.premium(&self.config.feed.symbol).await {
            Ok(reading) => {
                if let Some(pct) = reading.premium_pct() {
                    set_gauge(GaugeMetric::PremiumPct, pct);
                }
                self.last_premium = Some(reading);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Premium fetch failed");
                record_fetch_failure(FetchSource::Premium);
            }
        }
        self.last_premium
    }

    fn send_exit_alerts(&self, alerts: Vec<ExitAlert>) {
        for alert in alerts {
            record_exit_alert(alert.kind);
            self.queue(notify::exit_alert(&alert));
        }
    }

    async fn reference_move(&self, window: &HourWindow) -> Option<Decimal> {
        let open = window.reference_open?;
        let price = self.prices.price(&self.config.feed.reference_symbol).await?;
        Some(price - open)
    }

    async fn price_fresh(&self, symbol: &str, now: DateTime<Utc>) -> bool {
        let max_age = chrono::Duration::seconds(self.config.feed.stale_after_secs as i64);
        self.prices.is_fresh_at(symbol, max_age, now).await
    }

    fn slug_for(&self, open_time: DateTime<Utc>) -> String {
        market_slug(&self.config.odds.slug_prefix, self.tz, open_time)
    }

    fn queue(&self, notification: Notification) {
        if let Err(e) = self.notifications.try_send(notification) {
            tracing::warn!(error = %e, "Notification queue unavailable, dropping message");
        }
    }

    /// Current state as an immutable snapshot
    pub async fn snapshot(&self, now: DateTime<Utc>) -> StatusSnapshot {
        let symbol = &self.config.feed.symbol;
        let window = self.machine.window().copied();
        let price = self.prices.price(symbol).await;
        let reference_move = match &window {
            Some(w) => self.reference_move(w).await,
            None => None,
        };
        let direction = window
            .zip(price)
            .map(|(w, p)| Direction::from_move(p - w.open_price));

        StatusSnapshot {
            updated_at: now,
            phase: self.machine.phase(),
            hour_open: window.map(|w| w.open_time),
            minutes_left: window.map(|w| w.minutes_left(now)),
            slug: window.map(|w| self.slug_for(w.open_time)),
            price,
            price_fresh: self.price_fresh(symbol, now).await,
            price_move: window.zip(price).map(|(w, p)| p - w.open_price),
            reference_move,
            odds: self.last_odds.clone(),
            odds_samples: self.odds.len(),
            velocity: direction.map(|d| self.odds.velocity(d)),
            indicators: self.indicators,
            last_score: self.last_score.clone(),
            position: self.monitor.active().cloned(),
        }
    }

    async fn publish(&self, now: DateTime<Utc>) {
        let snapshot = self.snapshot(now).await;
        if let Some(velocity) = snapshot.velocity.and_then(|v| v.per_minute) {
            set_gauge(GaugeMetric::OddsVelocity, velocity);
        }
        self.status.send_replace(snapshot);
    }
}
