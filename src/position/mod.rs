//! Position exit monitoring
//!
//! Tracks the hour's recommended position and warns, once per kind, when
//! conditions turn against it. Positions are advisory only.

mod monitor;
mod types;

pub use monitor::PositionMonitor;
pub use types::{CheckOutcome, ExitAlert, ExitKind, Position, PositionEntry};
