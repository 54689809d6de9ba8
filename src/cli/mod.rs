//! CLI interface for poly-hourly
//!
//! Provides subcommands for:
//! - `run`: Start the hourly signal engine
//! - `status`: One-shot snapshot of the current hour
//! - `config`: Show the effective configuration
//! - `slug`: Print the market slug for an hour

mod run;
mod slug;
mod status;

pub use run::RunArgs;
pub use slug::SlugArgs;
pub use status::StatusArgs;

use crate::config::Config;
use crate::feed::BinanceKlines;
use crate::journal::{JsonlSignalLog, NullSignalLog, SignalLog};
use crate::liquidation::{BinanceLiquidations, LiquidationSource, NoLiquidations};
use crate::odds::GammaClient;
use crate::premium::{BinancePremium, CachedPremium};
use crate::strategy::Sources;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "poly-hourly")]
#[command(about = "Hourly ETH up/down signal engine for Polymarket")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the signal engine
    Run(RunArgs),
    /// Fetch the current hour once and print a snapshot
    Status(StatusArgs),
    /// Show configuration
    Config,
    /// Print the market slug for an hour
    Slug(SlugArgs),
}

/// HTTP-backed sources for a configuration
pub(crate) fn live_sources(config: &Config, journal: bool) -> anyhow::Result<Sources> {
    let liquidations: Arc<dyn LiquidationSource> = if config.liquidation.enabled {
        Arc::new(BinanceLiquidations::new(&config.liquidation)?)
    } else {
        Arc::new(NoLiquidations)
    };

    let journal: Arc<dyn SignalLog> = if journal && config.journal.enabled {
        Arc::new(JsonlSignalLog::new(config.journal.path.clone()))
    } else {
        Arc::new(NullSignalLog)
    };

    Ok(Sources {
        candles: Arc::new(BinanceKlines::new(&config.candles)?),
        odds: Arc::new(GammaClient::new(&config.odds)?),
        premium: Arc::new(CachedPremium::new(
            BinancePremium::new(&config.premium)?,
            Duration::from_secs(config.premium.cache_ttl_secs),
        )),
        liquidations,
        journal,
    })
}
