//! Notification formatting for alerts, exits and hour boundaries

use super::{Notification, Severity};
use crate::odds::{assess_odds, OddsVelocity};
use crate::position::{ExitAlert, ExitKind};
use crate::premium::PremiumAssessment;
use crate::signal::{ConfidenceScore, Direction, Recommendation};
use rust_decimal::Decimal;

/// Everything shown in an hourly signal alert
#[derive(Debug, Clone)]
pub struct SignalAlert<'a> {
    pub symbol: &'a str,
    pub direction: Direction,
    pub price: Decimal,
    pub price_move: Decimal,
    pub score: &'a ConfidenceScore,
    pub odds: Option<Decimal>,
    pub velocity: OddsVelocity,
    pub relative_volume: Option<Decimal>,
    pub reference_move: Option<Decimal>,
    pub premium: Option<&'a PremiumAssessment>,
    pub liquidation_usd: Decimal,
    pub minutes_left: i64,
    pub slug: &'a str,
}

fn signed_usd(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded >= Decimal::ZERO {
        format!("+${rounded:.2}")
    } else {
        format!("-${:.2}", rounded.abs())
    }
}

fn score_bar(score: u32) -> String {
    let filled = ((score + 5) / 10).min(10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn recommendation_severity(recommendation: Recommendation) -> Severity {
    match recommendation {
        Recommendation::Buy => Severity::Success,
        Recommendation::SmallBet => Severity::Warning,
        Recommendation::Skip => Severity::Danger,
        Recommendation::Wait => Severity::Info,
    }
}

/// The hour's one signal alert
pub fn signal_alert(alert: &SignalAlert<'_>) -> Notification {
    let score = alert.score;
    let asset = alert.symbol.trim_end_matches("USDT");
    let summary = format!(
        "{} {} | {} {} (score {}) | {} ${:.2}",
        score.recommendation,
        alert.direction,
        asset,
        signed_usd(alert.price_move),
        score.score,
        asset,
        alert.price.round_dp(2),
    );

    let mut description = format!(
        "**{}**\n`{}` **{}/100**\n",
        score.strength.as_str(),
        score_bar(score.score),
        score.score
    );
    for line in &score.breakdown {
        description.push_str(&format!("\n> {} `+{}`", line.label, line.points));
    }
    if let Some(gate) = score.gate {
        description.push_str(&format!("\n\nOverride: {}", gate.describe()));
    }

    let odds = match alert.odds {
        Some(odds) => format!("{:.2} ({})", odds.round_dp(2), assess_odds(odds)),
        None => "n/a".to_string(),
    };
    let flow = match score.atr_ratio {
        Some(ratio) => format!("{} ({:.1}x ATR)", signed_usd(alert.price_move), ratio.round_dp(1)),
        None => signed_usd(alert.price_move),
    };
    let volume = alert
        .relative_volume
        .map(|v| format!("{:.1}x avg", v.round_dp(1)))
        .unwrap_or_else(|| "n/a".to_string());
    let reference = alert
        .reference_move
        .map(signed_usd)
        .unwrap_or_else(|| "n/a".to_string());
    let risk = alert
        .premium
        .map(|p| format!("{} ({:.3}%)", p.bounce_risk.as_str(), p.premium_pct.round_dp(3)))
        .unwrap_or_else(|| "n/a".to_string());

    let mut notification = Notification::new(
        summary,
        format!("{} {}", score.recommendation, alert.direction),
        recommendation_severity(score.recommendation),
    )
    .signal(score.recommendation, score.score)
    .description(description)
    .field("Odds", odds)
    .field("Velocity", alert.velocity.status.as_str())
    .field("Flow", flow)
    .field("Volume", volume)
    .field("Reference", reference)
    .field("Bounce Risk", risk)
    .field("Time Left", format!("{}m", alert.minutes_left))
    .field("Market", alert.slug);

    if alert.liquidation_usd > Decimal::ZERO {
        let millions = (alert.liquidation_usd / Decimal::from(1_000_000)).round_dp(1);
        notification = notification.field("Liquidations", format!("${millions:.1}M"));
    }
    notification
}

fn exit_severity(kind: ExitKind) -> Severity {
    match kind {
        ExitKind::PriceReversal | ExitKind::ReferenceReversal => Severity::Warning,
        ExitKind::PremiumFlip | ExitKind::StopLoss => Severity::Danger,
        ExitKind::TakeProfit => Severity::Success,
    }
}

/// An exit warning for the open position
pub fn exit_alert(alert: &ExitAlert) -> Notification {
    let entry = alert
        .entry
        .map(|v| v.round_dp(4).to_string())
        .unwrap_or_else(|| "n/a".to_string());

    Notification::new(
        format!("{} | {} position", alert.kind.as_str(), alert.direction),
        alert.kind.title(),
        exit_severity(alert.kind),
    )
    .description(alert.message.clone())
    .field("Position", alert.direction.as_str())
    .field("Entry", entry)
    .field("Current", alert.current.round_dp(4).to_string())
    .at(alert.at)
}

/// Notice that a new hour window opened
pub fn new_hour(symbol: &str, slug: &str, open_price: Decimal) -> Notification {
    Notification::new(
        format!("New hour | {slug}"),
        "NEW HOUR",
        Severity::Info,
    )
    .field("Open", format!("${:.2}", open_price.round_dp(2)))
    .field("Asset", symbol)
    .field("Market", slug)
}

/// Result of the previous hour's market and how the alert fared
pub fn resolution(
    slug: &str,
    winner: Direction,
    alerted: Option<(Direction, Recommendation)>,
) -> Notification {
    let (severity, verdict) = match alerted {
        Some((direction, _)) if direction == winner => (Severity::Success, "signal correct"),
        Some(_) => (Severity::Danger, "signal wrong"),
        None => (Severity::Info, "no signal"),
    };

    let mut notification = Notification::new(
        format!("Resolved {winner} | {slug} | {verdict}"),
        "HOUR RESOLVED",
        severity,
    )
    .field("Winner", winner.as_str())
    .field("Market", slug);

    if let Some((direction, recommendation)) = alerted {
        notification = notification.field("Signal", format!("{recommendation} {direction}"));
    }
    notification
}
