//! Errors returned by the planner

use thiserror::Error;

use crate::task::{DayKey, TaskId};

/// The error type remote sources return
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// Which remote operation a [`PlannerError::Persistence`] is about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Add,
    Toggle,
    Edit,
    Delete,
    Move,
    Import,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Add => write!(f, "task creation"),
            Operation::Toggle => write!(f, "completion change"),
            Operation::Edit => write!(f, "task edition"),
            Operation::Delete => write!(f, "task deletion"),
            Operation::Move => write!(f, "task move"),
            Operation::Import => write!(f, "import"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PlannerError {
    /// A remote call failed after its change had been applied locally. The local change has been rolled back.
    #[error("unable to persist the {operation}: {source}")]
    Persistence {
        operation: Operation,
        source: RemoteError,
    },

    /// Sending a reminder failed. The task is still marked as not notified.
    #[error("unable to send a reminder for task {id}: {source}")]
    Notify {
        id: TaskId,
        source: RemoteError,
    },

    /// Imported (or loaded) data is not a map of days to task lists
    #[error("invalid planner data: {0}")]
    InvalidFormat(String),

    #[error("invalid task: {0}")]
    InvalidDraft(String),

    #[error("no task {id} on {date}")]
    TaskNotFound {
        date: DayKey,
        id: TaskId,
    },

    #[error("no task at position {index} on {date}")]
    InvalidPosition {
        date: DayKey,
        index: usize,
    },

    /// Another change of this task is still waiting for the server
    #[error("task {0} has a change pending")]
    TaskBusy(TaskId),

    /// Loading or exporting from the remote failed. Nothing changed locally.
    #[error("unable to fetch from the planner service: {0}")]
    Fetch(RemoteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    pub(crate) fn persistence(operation: Operation, source: RemoteError) -> Self {
        PlannerError::Persistence { operation, source }
    }

    /// Whether this error comes from a failed remote call
    pub fn is_remote(&self) -> bool {
        matches!(self, PlannerError::Persistence{..} | PlannerError::Notify{..} | PlannerError::Fetch(_))
    }
}
