//! Append-only signal journal (JSON lines)

use crate::premium::BounceRisk;
use crate::signal::{ConfidenceScore, Direction, FactorScore, Recommendation, Strength};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// One journal line per hourly alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Open time of the hour window
    pub hour: DateTime<Utc>,
    pub direction: Direction,
    pub price: Decimal,
    #[serde(rename = "move")]
    pub price_move: Decimal,
    pub score: u32,
    pub strength: Strength,
    pub recommendation: Recommendation,
    pub breakdown: Vec<FactorScore>,
    pub odds: Option<Decimal>,
    pub bounce_risk: Option<BounceRisk>,
}

impl SignalRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        hour: DateTime<Utc>,
        direction: Direction,
        price: Decimal,
        price_move: Decimal,
        score: &ConfidenceScore,
        odds: Option<Decimal>,
        bounce_risk: Option<BounceRisk>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            hour,
            direction,
            price,
            price_move,
            score: score.score,
            strength: score.strength,
            recommendation: score.recommendation,
            breakdown: score.breakdown.clone(),
            odds,
            bounce_risk,
        }
    }
}

/// Destination for signal records
#[async_trait]
pub trait SignalLog: Send + Sync {
    async fn append(&self, record: &SignalRecord) -> anyhow::Result<()>;
}

/// Journal that discards everything
pub struct NullSignalLog;

#[async_trait]
impl SignalLog for NullSignalLog {
    async fn append(&self, _record: &SignalRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Appends one JSON object per line to a file
pub struct JsonlSignalLog {
    path: PathBuf,
}

impl JsonlSignalLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record; malformed lines are skipped
    pub async fn read_all(&self) -> anyhow::Result<Vec<SignalRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to read signal journal"),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed journal line");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl SignalLog for JsonlSignalLog {
    async fn append(&self, record: &SignalRecord) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut line = serde_json::to_string(record).context("Failed to encode signal record")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(
            recommendation = record.recommendation.as_str(),
            price = %record.price,
            "Signal journaled"
        );
        Ok(())
    }
}
