//! poly-hourly: Hourly ETH up/down signal engine for Polymarket
//!
//! This library provides the core components for:
//! - Real-time price feeds and klines from Binance
//! - ATR and relative volume indicators
//! - Hourly market odds and odds velocity via the Gamma API
//! - Futures premium and liquidation context
//! - Confidence scoring with hard gates
//! - One alert per hour through a small state machine
//! - Exit monitoring for the alerted position
//! - Webhook notifications and a JSONL signal journal

pub mod cli;
pub mod config;
pub mod feed;
pub mod indicator;
pub mod journal;
pub mod liquidation;
pub mod notify;
pub mod odds;
pub mod position;
pub mod premium;
pub mod signal;
pub mod strategy;
pub mod telemetry;
pub mod ws;
