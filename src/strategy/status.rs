//! Read-only view of the strategy state

use super::Phase;
use crate::indicator::IndicatorSnapshot;
use crate::odds::{MarketOdds, OddsVelocity};
use crate::position::Position;
use crate::signal::ConfidenceScore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Immutable snapshot published after every state change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub updated_at: DateTime<Utc>,
    pub phase: Phase,
    pub hour_open: Option<DateTime<Utc>>,
    pub minutes_left: Option<i64>,
    pub slug: Option<String>,
    pub price: Option<Decimal>,
    /// Whether the last tick is younger than the staleness limit
    pub price_fresh: bool,
    pub price_move: Option<Decimal>,
    pub reference_move: Option<Decimal>,
    pub odds: Option<MarketOdds>,
    pub odds_samples: usize,
    pub velocity: Option<OddsVelocity>,
    pub indicators: Option<IndicatorSnapshot>,
    pub last_score: Option<ConfidenceScore>,
    pub position: Option<Position>,
}

impl StatusSnapshot {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            phase: Phase::Waiting,
            hour_open: None,
            minutes_left: None,
            slug: None,
            price: None,
            price_fresh: false,
            price_move: None,
            reference_move: None,
            odds: None,
            odds_samples: 0,
            velocity: None,
            indicators: None,
            last_score: None,
            position: None,
        }
    }

    /// One-line summary for logs and the CLI
    pub fn status_line(&self) -> String {
        fn show(value: Option<Decimal>, dp: u32) -> String {
            value
                .map(|v| v.round_dp(dp).to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        let odds = self
            .odds
            .as_ref()
            .map(|o| format!("{}/{}", show(o.up, 2), show(o.down, 2)))
            .unwrap_or_else(|| "-".to_string());
        let stale = if self.price.is_some() && !self.price_fresh {
            " (stale)"
        } else {
            ""
        };
        let score = self
            .last_score
            .as_ref()
            .map(|s| format!("{} {}", s.score, s.recommendation))
            .unwrap_or_else(|| "-".to_string());
        let position = self
            .position
            .as_ref()
            .map(|p| p.direction().as_str())
            .unwrap_or("none");

        format!(
            concat!(
                "{} | price {}{} | move {} | ref {} | odds up/down {} | ",
                "score {} | position {} | {}m left | {}"
            ),
            self.phase.as_str(),
            show(self.price, 2),
            stale,
            show(self.price_move, 2),
            show(self.reference_move, 2),
            odds,
            score,
            position,
            self.minutes_left.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
            self.slug.as_deref().unwrap_or("-"),
        )
    }
}

/// Mirror every published snapshot into `path` as JSON until the
/// strategy drops its sender
pub fn spawn_status_writer(
    mut status: watch::Receiver<StatusSnapshot>,
    path: PathBuf,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let staging = path.with_extension("tmp");
        loop {
            let encoded = serde_json::to_vec_pretty(&*status.borrow_and_update());
            match encoded {
                Ok(json) => {
                    let written = async {
                        tokio::fs::write(&staging, &json).await?;
                        tokio::fs::rename(&staging, &path).await
                    };
                    if let Err(e) = written.await {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to write status file"
                        );
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to encode status snapshot"),
            }

            if status.changed().await.is_err() {
                break;
            }
        }
    })
}
