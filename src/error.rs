use thiserror::Error;

use crate::core::edge::EdgeId;
use crate::core::task::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task {task_id} cannot depend on itself")]
    InvalidEdge { task_id: TaskId },

    #[error("This would create a circular dependency: {task_id} -> {depends_on}")]
    RejectedCycle { task_id: TaskId, depends_on: TaskId },

    #[error("Task {task_id} already depends on {depends_on}")]
    DuplicateEdge { task_id: TaskId, depends_on: TaskId },

    #[error("Schedule could not be computed for {count} tasks (cycle detected)")]
    CycleDetected { count: usize, tasks: Vec<TaskId> },

    #[error("Dependency not found: {0}")]
    EdgeNotFound(EdgeId),
}

impl Error {
    /// Whether the error is an expected rejection of user input rather
    /// than a storage or data-integrity fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidEdge { .. } | Error::RejectedCycle { .. } | Error::DuplicateEdge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
