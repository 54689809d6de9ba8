//! Slug command implementation

use crate::config::Config;
use crate::odds::{local_hour, market_slug, parse_timezone};
use chrono::{DateTime, DurationRound, Utc};
use clap::Args;

#[derive(Args, Debug)]
pub struct SlugArgs {
    /// Any instant inside the hour (RFC 3339), defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

impl SlugArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let tz = parse_timezone(&config.odds.timezone)?;
        let at = self.at.unwrap_or_else(Utc::now);
        let hour = at.duration_trunc(chrono::Duration::hours(1))?;

        println!("{}", market_slug(&config.odds.slug_prefix, tz, hour));
        println!("  local hour: {} ({})", local_hour(tz, hour), tz);
        Ok(())
    }
}
