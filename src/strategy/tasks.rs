//! Named periodic tasks and their control handle

use std::collections::HashSet;
use std::str::FromStr;
use tokio::sync::mpsc;

/// Periodic tasks run by the strategy loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    CandleRefresh,
    Evaluate,
    PositionCheck,
    StatusReport,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::CandleRefresh,
        TaskKind::Evaluate,
        TaskKind::PositionCheck,
        TaskKind::StatusReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::CandleRefresh => "candles",
            TaskKind::Evaluate => "evaluate",
            TaskKind::PositionCheck => "position",
            TaskKind::StatusReport => "status",
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| {
                format!("unknown task '{s}', expected candles, evaluate, position or status")
            })
    }
}

/// Control message for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCommand {
    Cancel(TaskKind),
    Resume(TaskKind),
}

/// Handle for cancelling or resuming individual tasks
#[derive(Debug, Clone)]
pub struct TaskControl {
    tx: mpsc::Sender<TaskCommand>,
}

impl TaskControl {
    /// Create a handle and the receiver the strategy loop listens on
    pub fn channel() -> (Self, mpsc::Receiver<TaskCommand>) {
        let (tx, rx) = mpsc::channel(16);
        (Self { tx }, rx)
    }

    pub async fn cancel(&self, task: TaskKind) -> anyhow::Result<()> {
        self.tx
            .send(TaskCommand::Cancel(task))
            .await
            .map_err(|_| anyhow::anyhow!("strategy loop has stopped"))
    }

    pub async fn resume(&self, task: TaskKind) -> anyhow::Result<()> {
        self.tx
            .send(TaskCommand::Resume(task))
            .await
            .map_err(|_| anyhow::anyhow!("strategy loop has stopped"))
    }
}

/// Set of tasks currently allowed to run
#[derive(Debug, Clone)]
pub struct ActiveTasks {
    enabled: HashSet<TaskKind>,
}

impl Default for ActiveTasks {
    fn default() -> Self {
        Self {
            enabled: TaskKind::ALL.into_iter().collect(),
        }
    }
}

impl ActiveTasks {
    pub fn apply(&mut self, command: TaskCommand) {
        match command {
            TaskCommand::Cancel(task) => {
                if self.enabled.remove(&task) {
                    tracing::info!(?task, "Task cancelled");
                }
            }
            TaskCommand::Resume(task) => {
                if self.enabled.insert(task) {
                    tracing::info!(?task, "Task resumed");
                }
            }
        }
    }

    pub fn is_enabled(&self, task: TaskKind) -> bool {
        self.enabled.contains(&task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_enabled_by_default() {
        let tasks = ActiveTasks::default();
        assert!(TaskKind::ALL.iter().all(|t| tasks.is_enabled(*t)));
    }

    #[test]
    fn test_cancel_and_resume() {
        let mut tasks = ActiveTasks::default();
        tasks.apply(TaskCommand::Cancel(TaskKind::PositionCheck));
        assert!(!tasks.is_enabled(TaskKind::PositionCheck));
        assert!(tasks.is_enabled(TaskKind::Evaluate));

        tasks.apply(TaskCommand::Resume(TaskKind::PositionCheck));
        assert!(tasks.is_enabled(TaskKind::PositionCheck));
    }

    #[test]
    fn test_parse_task_names() {
        assert_eq!("position".parse::<TaskKind>(), Ok(TaskKind::PositionCheck));
        assert_eq!("candles".parse::<TaskKind>(), Ok(TaskKind::CandleRefresh));
        assert!("exits".parse::<TaskKind>().is_err());
    }

    #[tokio::test]
    async fn test_control_sends_commands() {
        let (control, mut rx) = TaskControl::channel();
        tokio_test::assert_ok!(control.cancel(TaskKind::StatusReport).await);
        assert_eq!(rx.recv().await, Some(TaskCommand::Cancel(TaskKind::StatusReport)));

        drop(rx);
        tokio_test::assert_err!(control.resume(TaskKind::StatusReport).await);
    }
}
