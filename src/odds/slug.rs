//! Hourly market slug derivation
//!
//! Hourly up/down markets are named after their start hour in the
//! market's local timezone, e.g. `ethereum-up-or-down-january-14-3pm-et`.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> anyhow::Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Unknown timezone {name}: {e}"))
}

/// Slug of the market covering the hour that contains `at`
pub fn market_slug(prefix: &str, tz: Tz, at: DateTime<Utc>) -> String {
    let local = at.with_timezone(&tz);
    let month = MONTHS[local.month0() as usize];
    let (is_pm, hour12) = local.hour12();
    let suffix = if is_pm { "pm" } else { "am" };

    format!("{prefix}-{month}-{}-{hour12}{suffix}-et", local.day())
}

/// Hour of day (0-23) in the market timezone
pub fn local_hour(tz: Tz, at: DateTime<Utc>) -> u32 {
    at.with_timezone(&tz).hour()
}
