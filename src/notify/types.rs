//! Notification types

use crate::signal::Recommendation;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Colour class of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    /// Embed colour (RGB)
    pub fn color(self) -> u32 {
        match self {
            Severity::Info => 0x3498db,
            Severity::Success => 0x00ff00,
            Severity::Warning => 0xff6600,
            Severity::Danger => 0xff0000,
        }
    }
}

/// One labelled value shown with a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}

/// Marks a notification as an hourly signal alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalTag {
    pub recommendation: Recommendation,
    pub score: u32,
}

/// A formatted message for the notification sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// One-line summary (message content)
    pub summary: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<Field>,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    /// Set on signal alerts only
    pub signal: Option<SignalTag>,
}

impl Notification {
    pub fn new(summary: impl Into<String>, title: impl Into<String>, severity: Severity) -> Self {
        Self {
            summary: summary.into(),
            title: title.into(),
            description: String::new(),
            fields: Vec::new(),
            severity,
            timestamp: Utc::now(),
            signal: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::new(name, value));
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn signal(mut self, recommendation: Recommendation, score: u32) -> Self {
        self.signal = Some(SignalTag {
            recommendation,
            score,
        });
        self
    }

    /// Whether this is a BUY signal alert
    pub fn is_buy_signal(&self) -> bool {
        matches!(self.signal, Some(tag) if tag.recommendation == Recommendation::Buy)
    }

    /// Value of the first field with this name
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}
