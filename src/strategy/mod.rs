//! Hourly signal strategy
//!
//! The state machine tracks where we are in the hour, the runner owns all
//! mutable state and drives the periodic tasks.

mod machine;
mod runner;
mod status;
mod tasks;

pub use machine::{AlertPermit, HourWindow, HourlyStateMachine, Phase, WindowChange};
pub use runner::{HourlyStrategy, Sources};
pub use status::{spawn_status_writer, StatusSnapshot};
pub use tasks::{ActiveTasks, TaskCommand, TaskControl, TaskKind};
