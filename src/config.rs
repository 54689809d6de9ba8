//! Configuration types for poly-hourly
//!
//! Every field carries a serde default, so an empty TOML file is a valid
//! configuration and `Config::default()` matches the documented values.

use crate::indicator::VOLUME_PERIOD;
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub candles: CandleConfig,
    #[serde(default)]
    pub odds: OddsConfig,
    #[serde(default)]
    pub premium: PremiumConfig,
    #[serde(default)]
    pub liquidation: LiquidationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Live trade stream configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Traded asset (e.g. "ETHUSDT")
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Correlated reference asset used for cross-asset confirmation
    #[serde(default = "default_reference_symbol")]
    pub reference_symbol: String,

    /// Combined-stream WebSocket endpoint
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// A price older than this is reported as stale
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

fn default_symbol() -> String {
    "ETHUSDT".to_string()
}
fn default_reference_symbol() -> String {
    "BTCUSDT".to_string()
}
fn default_ws_url() -> String {
    "wss://stream.binance.com:9443/stream".to_string()
}
fn default_stale_after() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            reference_symbol: default_reference_symbol(),
            ws_url: default_ws_url(),
            stale_after_secs: default_stale_after(),
        }
    }
}

/// Hourly candle polling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CandleConfig {
    #[serde(default = "default_spot_url")]
    pub base_url: String,

    #[serde(default = "default_candle_interval")]
    pub interval: String,

    /// Bars requested per refresh, including the in-progress bar
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_candle_refresh")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_slow_timeout")]
    pub timeout_secs: u64,
}

fn default_spot_url() -> String {
    "https://api.binance.com".to_string()
}
fn default_candle_interval() -> String {
    "1h".to_string()
}
fn default_history_limit() -> usize {
    22
}
fn default_candle_refresh() -> u64 {
    60
}
fn default_slow_timeout() -> u64 {
    10
}
fn default_fast_timeout() -> u64 {
    5
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            base_url: default_spot_url(),
            interval: default_candle_interval(),
            history_limit: default_history_limit(),
            refresh_interval_secs: default_candle_refresh(),
            timeout_secs: default_slow_timeout(),
        }
    }
}

/// Prediction-market odds configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OddsConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,

    /// Slug prefix, e.g. "ethereum-up-or-down"
    #[serde(default = "default_slug_prefix")]
    pub slug_prefix: String,

    /// IANA timezone the market slugs are named in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Samples kept for velocity
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Odds change per minute considered rising
    #[serde(default = "default_velocity_rising")]
    pub velocity_rising: Decimal,

    /// Odds change per minute considered a rapid rise
    #[serde(default = "default_velocity_rapid")]
    pub velocity_rapid: Decimal,

    /// Minimum span (minutes) between oldest and newest sample
    #[serde(default = "default_min_velocity_minutes")]
    pub min_velocity_minutes: Decimal,

    #[serde(default = "default_fast_timeout")]
    pub timeout_secs: u64,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}
fn default_slug_prefix() -> String {
    "ethereum-up-or-down".to_string()
}
fn default_timezone() -> String {
    "America/New_York".to_string()
}
fn default_history_capacity() -> usize {
    10
}
fn default_velocity_rising() -> Decimal {
    Decimal::new(1, 2) // 0.01/min
}
fn default_velocity_rapid() -> Decimal {
    Decimal::new(2, 2) // 0.02/min
}
fn default_min_velocity_minutes() -> Decimal {
    Decimal::new(5, 1)
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            slug_prefix: default_slug_prefix(),
            timezone: default_timezone(),
            history_capacity: default_history_capacity(),
            velocity_rising: default_velocity_rising(),
            velocity_rapid: default_velocity_rapid(),
            min_velocity_minutes: default_min_velocity_minutes(),
            timeout_secs: default_fast_timeout(),
        }
    }
}

/// Futures premium configuration (all thresholds in percent)
#[derive(Debug, Clone, Deserialize)]
pub struct PremiumConfig {
    #[serde(default = "default_futures_url")]
    pub base_url: String,

    #[serde(default = "default_premium_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_high_threshold")]
    pub high_threshold_pct: Decimal,

    #[serde(default = "default_medium_threshold")]
    pub medium_threshold_pct: Decimal,

    /// Opposite-sign premium beyond this leaves "room to run"
    #[serde(default = "default_room_to_run")]
    pub room_to_run_pct: Decimal,

    #[serde(default = "default_fast_timeout")]
    pub timeout_secs: u64,
}

fn default_futures_url() -> String {
    "https://fapi.binance.com".to_string()
}
fn default_premium_ttl() -> u64 {
    5
}
fn default_high_threshold() -> Decimal {
    Decimal::new(15, 2)
}
fn default_medium_threshold() -> Decimal {
    Decimal::new(8, 2)
}
fn default_room_to_run() -> Decimal {
    Decimal::new(5, 2)
}

impl Default for PremiumConfig {
    fn default() -> Self {
        Self {
            base_url: default_futures_url(),
            cache_ttl_secs: default_premium_ttl(),
            high_threshold_pct: default_high_threshold(),
            medium_threshold_pct: default_medium_threshold(),
            room_to_run_pct: default_room_to_run(),
            timeout_secs: default_fast_timeout(),
        }
    }
}

/// Liquidation estimate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LiquidationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_futures_url")]
    pub base_url: String,

    /// Estimate at or above this counts as a cascade
    #[serde(default = "default_cascade_threshold")]
    pub cascade_threshold_usd: Decimal,

    #[serde(default = "default_liquidation_ttl")]
    pub cache_ttl_secs: u64,

    /// Open-interest drop (percent) treated as forced liquidation
    #[serde(default = "default_min_drop")]
    pub min_drop_pct: Decimal,

    /// Previous reading must be younger than this to compare against
    #[serde(default = "default_lookback")]
    pub lookback_secs: u64,

    #[serde(default = "default_fast_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_cascade_threshold() -> Decimal {
    Decimal::new(30_000_000, 0)
}
fn default_liquidation_ttl() -> u64 {
    60
}
fn default_min_drop() -> Decimal {
    Decimal::ONE
}
fn default_lookback() -> u64 {
    300
}

impl Default for LiquidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_futures_url(),
            cascade_threshold_usd: default_cascade_threshold(),
            cache_ttl_secs: default_liquidation_ttl(),
            min_drop_pct: default_min_drop(),
            lookback_secs: default_lookback(),
            timeout_secs: default_fast_timeout(),
        }
    }
}

/// How a DOWN recommendation is meant to be traded
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DirectionMode {
    /// UP/DOWN buys the matching outcome token
    #[default]
    BinaryOutcome,
    /// Only UP recommendations become tracked positions
    LongOnly,
}

/// Confidence scoring thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Reference asset move (USD) that confirms the direction
    #[serde(default = "default_reference_confirm")]
    pub reference_confirm_usd: Decimal,

    /// Odds below this earn the odds-level points
    #[serde(default = "default_good_odds")]
    pub good_odds: Decimal,

    /// Odds at or above this force SKIP
    #[serde(default = "default_max_buy_odds")]
    pub max_buy_odds: Decimal,

    /// Minimum score for an evaluation to qualify as the hour's alert
    #[serde(default = "default_alert_min_score")]
    pub alert_min_score: u32,

    #[serde(default)]
    pub direction_mode: DirectionMode,
}

fn default_reference_confirm() -> Decimal {
    Decimal::new(150, 0)
}
fn default_good_odds() -> Decimal {
    Decimal::new(65, 2)
}
fn default_max_buy_odds() -> Decimal {
    Decimal::new(75, 2)
}
fn default_alert_min_score() -> u32 {
    50
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reference_confirm_usd: default_reference_confirm(),
            good_odds: default_good_odds(),
            max_buy_odds: default_max_buy_odds(),
            alert_min_score: default_alert_min_score(),
            direction_mode: DirectionMode::BinaryOutcome,
        }
    }
}

/// Hourly window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// Minute of the hour when alerts become possible
    #[serde(default = "default_entry_window_start")]
    pub entry_window_start_minute: u32,

    /// Local market hours (0-23) in which every recommendation is SKIP
    #[serde(default = "default_skip_hours")]
    pub skip_hours: Vec<u32>,

    /// Score evaluation period
    #[serde(default = "default_evaluate_interval")]
    pub evaluate_interval_secs: u64,

    /// Status line period
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,
}

fn default_entry_window_start() -> u32 {
    40
}
fn default_skip_hours() -> Vec<u32> {
    vec![3, 4, 5]
}
fn default_evaluate_interval() -> u64 {
    5
}
fn default_status_interval() -> u64 {
    30
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            entry_window_start_minute: default_entry_window_start(),
            skip_hours: default_skip_hours(),
            evaluate_interval_secs: default_evaluate_interval(),
            status_interval_secs: default_status_interval(),
        }
    }
}

/// Exit-risk thresholds for a registered position
#[derive(Debug, Clone, Deserialize)]
pub struct ExitConfig {
    /// Adverse move (USD) of the traded asset from entry
    #[serde(default = "default_price_reversal")]
    pub price_reversal_usd: Decimal,

    /// Adverse move (USD) of the reference asset from entry
    #[serde(default = "default_reference_reversal")]
    pub reference_reversal_usd: Decimal,

    /// Odds below this suggest taking profit
    #[serde(default = "default_take_profit_odds")]
    pub take_profit_odds: Decimal,

    /// Odds above this warn of a bad entry
    #[serde(default = "default_stop_loss_odds")]
    pub stop_loss_odds: Decimal,

    #[serde(default = "default_exit_check_interval")]
    pub check_interval_secs: u64,
}

fn default_price_reversal() -> Decimal {
    Decimal::new(15, 0)
}
fn default_reference_reversal() -> Decimal {
    Decimal::new(200, 0)
}
fn default_take_profit_odds() -> Decimal {
    Decimal::new(50, 2) // 0.50
}
fn default_stop_loss_odds() -> Decimal {
    Decimal::new(85, 2) // 0.85
}
fn default_exit_check_interval() -> u64 {
    5
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            price_reversal_usd: default_price_reversal(),
            reference_reversal_usd: default_reference_reversal(),
            take_profit_odds: default_take_profit_odds(),
            stop_loss_odds: default_stop_loss_odds(),
            check_interval_secs: default_exit_check_interval(),
        }
    }
}

/// Notification sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Discord webhook; alerts are only logged when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_footer")]
    pub footer: String,

    #[serde(default = "default_slow_timeout")]
    pub timeout_secs: u64,

    /// SMTP delivery of high-confidence BUY alerts
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

fn default_footer() -> String {
    "Hourly Signal Bot".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            footer: default_footer(),
            timeout_secs: default_slow_timeout(),
            email: None,
        }
    }
}

/// SMTP settings for the BUY alert mail
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// STARTTLS submission port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Sender mailbox; the username when unset
    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub to: String,

    #[serde(default = "default_slow_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}

impl EmailConfig {
    /// Mail is only sent with a login and a recipient
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.to.is_empty()
    }
}

/// Signal log configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_journal_path")]
    pub path: PathBuf,
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("./logs/signals.jsonl")
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_journal_path(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus listener port; metrics are not exported when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

/// Bars a candle refresh must request: the indicator history plus the
/// in-progress bar
pub const MIN_HISTORY_LIMIT: usize = VOLUME_PERIOD + 1;

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would leave a component permanently idle
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.candles.history_limit >= MIN_HISTORY_LIMIT,
            "candles.history_limit is {}, indicators need at least {}",
            self.candles.history_limit,
            MIN_HISTORY_LIMIT
        );
        anyhow::ensure!(
            self.window.entry_window_start_minute < 60,
            "window.entry_window_start_minute must be below 60"
        );
        if let Some(email) = &self.notify.email {
            if !email.has_credentials() {
                tracing::warn!("[notify.email] present without credentials, email alerts disabled");
            }
        }
        Ok(())
    }
}

impl WindowConfig {
    pub fn evaluate_interval(&self) -> Duration {
        Duration::from_secs(self.evaluate_interval_secs.max(1))
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs.max(1))
    }
}

impl ExitConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }
}

impl CandleConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}
