use crate::priority::PriorityLevel;
use crate::queue::TaskId;
use std::error::Error as StdError;
use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by a fallible task, optionally wrapping the error that caused it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A task failed; the rest of its queue's turn was abandoned.
    #[error("task {task:?} failed while processing {priority} work: {source}")]
    Task {
        priority: PriorityLevel,
        task: TaskId,
        #[source]
        source: TaskError,
    },

    /// A task asked the scheduler to run its own queue while it was still running.
    #[error("task {task:?} re-entered {priority} processing while it was running")]
    Reentrant { priority: PriorityLevel, task: TaskId },
}

impl SchedulerError {
    pub fn priority(&self) -> PriorityLevel {
        match self {
            SchedulerError::Task { priority, .. } | SchedulerError::Reentrant { priority, .. } => {
                *priority
            }
        }
    }

    pub fn task(&self) -> TaskId {
        match self {
            SchedulerError::Task { task, .. } | SchedulerError::Reentrant { task, .. } => *task,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("target frame rate must be greater than zero")]
    ZeroFrameRate,
}
