//! Dependency edge records.
//!
//! An edge states that `task_id` (the successor) is constrained by
//! `depends_on_task_id` (the predecessor). The dependency type says which
//! end of the predecessor constrains which end of the successor.

use crate::core::task::TaskId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persisted dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Create a new unique edge identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EdgeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// How the predecessor's timing constrains the successor's timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    /// Successor starts no earlier than the predecessor finishes.
    #[default]
    FinishToStart,
    /// Successor starts no earlier than the predecessor starts.
    StartToStart,
    /// Successor finishes no earlier than the predecessor finishes.
    FinishToFinish,
    /// Successor finishes no earlier than the predecessor starts.
    StartToFinish,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::FinishToStart,
        DependencyType::StartToStart,
        DependencyType::FinishToFinish,
        DependencyType::StartToFinish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "finish-to-start",
            DependencyType::StartToStart => "start-to-start",
            DependencyType::FinishToFinish => "finish-to-finish",
            DependencyType::StartToFinish => "start-to-finish",
        }
    }

    /// Whether the constraint lands on the successor's finish rather than its start.
    pub fn constrains_finish(&self) -> bool {
        matches!(
            self,
            DependencyType::FinishToFinish | DependencyType::StartToFinish
        )
    }

    /// Whether the constraint is taken from the predecessor's start rather than its finish.
    pub fn from_predecessor_start(&self) -> bool {
        matches!(
            self,
            DependencyType::StartToStart | DependencyType::StartToFinish
        )
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fs" | "finish-to-start" => Ok(DependencyType::FinishToStart),
            "ss" | "start-to-start" => Ok(DependencyType::StartToStart),
            "ff" | "finish-to-finish" => Ok(DependencyType::FinishToFinish),
            "sf" | "start-to-finish" => Ok(DependencyType::StartToFinish),
            other => Err(format!("unknown dependency type: {}", other)),
        }
    }
}

/// A persisted dependency between two tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub id: EdgeId,
    /// The dependent task (successor).
    pub task_id: TaskId,
    /// The prerequisite task (predecessor).
    pub depends_on_task_id: TaskId,
    #[serde(default)]
    pub dependency_type: DependencyType,
}

impl DependencyEdge {
    /// Create an edge with a fresh id.
    pub fn new(
        task_id: impl Into<TaskId>,
        depends_on_task_id: impl Into<TaskId>,
        dependency_type: DependencyType,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            task_id: task_id.into(),
            depends_on_task_id: depends_on_task_id.into(),
            dependency_type,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.task_id == self.depends_on_task_id
    }
}

/// A dependency that has been requested but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCandidate {
    pub task_id: TaskId,
    pub depends_on_task_id: TaskId,
    #[serde(default)]
    pub dependency_type: DependencyType,
}

impl EdgeCandidate {
    pub fn new(task_id: impl Into<TaskId>, depends_on_task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            depends_on_task_id: depends_on_task_id.into(),
            dependency_type: DependencyType::default(),
        }
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.task_id == self.depends_on_task_id
    }

    /// Turn the accepted candidate into a record with a fresh id.
    pub fn into_edge(self) -> DependencyEdge {
        DependencyEdge {
            id: EdgeId::new(),
            task_id: self.task_id,
            depends_on_task_id: self.depends_on_task_id,
            dependency_type: self.dependency_type,
        }
    }
}
