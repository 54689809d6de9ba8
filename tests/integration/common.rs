//! In-memory sources for driving the strategy without a network

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use poly_hourly::config::Config;
use poly_hourly::feed::{Candle, CandleSource, PriceCache, PriceTick};
use poly_hourly::journal::{SignalLog, SignalRecord};
use poly_hourly::liquidation::NoLiquidations;
use poly_hourly::notify::Notification;
use poly_hourly::odds::{market_slug, parse_timezone, MarketOdds, OddsSource};
use poly_hourly::premium::{PremiumReading, PremiumSource};
use poly_hourly::strategy::{HourlyStrategy, Sources};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const SYMBOL: &str = "ETHUSDT";
pub const REFERENCE: &str = "BTCUSDT";

/// 15:00 UTC on a January weekday, 10am in New York
pub fn hour_open() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 14, 15, 0, 0).unwrap()
}

pub fn at_minute(minute: i64) -> DateTime<Utc> {
    hour_open() + Duration::minutes(minute)
}

pub fn slug_for(open: DateTime<Utc>) -> String {
    let config = Config::default();
    let tz = parse_timezone(&config.odds.timezone).unwrap();
    market_slug(&config.odds.slug_prefix, tz, open)
}

/// 21 completed bars with a true range of 10 and volume 100, then the
/// in-progress bar opening at `open` with `open_price`
pub fn history(open: DateTime<Utc>, open_price: Decimal, current_volume: Decimal) -> Vec<Candle> {
    let mut bars: Vec<Candle> = (1..=21)
        .rev()
        .map(|back| Candle {
            open_time: open - Duration::hours(back),
            open: open_price,
            high: open_price + dec!(5),
            low: open_price - dec!(5),
            close: open_price,
            volume: dec!(100),
        })
        .collect();
    bars.push(Candle {
        open_time: open,
        open: open_price,
        high: open_price,
        low: open_price,
        close: open_price,
        volume: current_volume,
    });
    bars
}

#[derive(Default)]
pub struct FakeCandles {
    bars: Mutex<HashMap<String, Vec<Candle>>>,
}

impl FakeCandles {
    pub fn set(&self, symbol: &str, bars: Vec<Candle>) {
        self.bars.lock().unwrap().insert(symbol.to_string(), bars);
    }
}

#[async_trait]
impl CandleSource for FakeCandles {
    async fn candles(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let bars = self.bars.lock().unwrap();
        let all = bars
            .get(symbol)
            .ok_or_else(|| anyhow::anyhow!("no candles for {symbol}"))?;
        Ok(all[all.len().saturating_sub(limit)..].to_vec())
    }
}

#[derive(Default)]
pub struct FakeOdds {
    markets: Mutex<HashMap<String, MarketOdds>>,
}

impl FakeOdds {
    pub fn set(&self, slug: &str, up: Decimal, down: Decimal) {
        self.markets.lock().unwrap().insert(
            slug.to_string(),
            MarketOdds {
                slug: slug.to_string(),
                up: Some(up),
                down: Some(down),
                closed: false,
            },
        );
    }
}

#[async_trait]
impl OddsSource for FakeOdds {
    async fn market_odds(&self, slug: &str) -> anyhow::Result<Option<MarketOdds>> {
        Ok(self.markets.lock().unwrap().get(slug).cloned())
    }
}

pub struct FakePremium {
    reading: Mutex<PremiumReading>,
}

impl FakePremium {
    pub fn neutral() -> Self {
        Self {
            reading: Mutex::new(PremiumReading {
                mark_price: dec!(3000),
                index_price: dec!(3000),
                funding_rate: None,
            }),
        }
    }

    pub fn set_mark(&self, mark: Decimal) {
        self.reading.lock().unwrap().mark_price = mark;
    }
}

#[async_trait]
impl PremiumSource for FakePremium {
    async fn premium(&self, _symbol: &str) -> anyhow::Result<PremiumReading> {
        Ok(*self.reading.lock().unwrap())
    }
}

#[derive(Default)]
pub struct MemoryLog {
    pub records: Mutex<Vec<SignalRecord>>,
}

#[async_trait]
impl SignalLog for MemoryLog {
    async fn append(&self, record: &SignalRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Strategy wired to fakes, plus handles to steer them
pub struct Harness {
    pub strategy: HourlyStrategy,
    pub candles: Arc<FakeCandles>,
    pub odds: Arc<FakeOdds>,
    pub premium: Arc<FakePremium>,
    pub journal: Arc<MemoryLog>,
    pub prices: Arc<PriceCache>,
    pub notifications: mpsc::Receiver<Notification>,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        let candles = Arc::new(FakeCandles::default());
        let odds = Arc::new(FakeOdds::default());
        let premium = Arc::new(FakePremium::neutral());
        let journal = Arc::new(MemoryLog::default());
        let prices = Arc::new(PriceCache::new());
        let (tx, notifications) = mpsc::channel(32);

        let sources = Sources {
            candles: candles.clone(),
            odds: odds.clone(),
            premium: premium.clone(),
            liquidations: Arc::new(NoLiquidations),
            journal: journal.clone(),
        };
        let (strategy, _status) =
            HourlyStrategy::new(config, sources, Arc::clone(&prices), tx).unwrap();

        Self {
            strategy,
            candles,
            odds,
            premium,
            journal,
            prices,
            notifications,
        }
    }

    /// Hour at 3000 / 90000 with ATR 10 and 1.6x volume
    pub fn standard_hour(config: Config) -> Self {
        let harness = Self::new(config);
        harness.candles.set(SYMBOL, history(hour_open(), dec!(3000), dec!(160)));
        harness.candles.set(REFERENCE, history(hour_open(), dec!(90000), dec!(10)));
        harness
    }

    pub async fn tick(&self, symbol: &str, price: Decimal, at: DateTime<Utc>) {
        self.prices
            .update(PriceTick {
                symbol: symbol.to_string(),
                price,
                timestamp: at,
                exchange_ts: at,
            })
            .await;
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            out.push(notification);
        }
        out
    }

    pub fn journal_len(&self) -> usize {
        self.journal.records.lock().unwrap().len()
    }
}
