//! Task data model consumed by the scheduling core.
//!
//! Tasks are owned by the external record store; the core only reads
//! the scheduling-relevant fields of a snapshot.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a task in the external store.
///
/// Store ids are opaque strings, so no format is imposed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a scheduling scope, typically a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub String);

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task as seen by the scheduling core.
///
/// All timing fields are optional. A task with neither dates nor an
/// estimate is a zero-duration milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Human-readable title, carried through for logging only.
    #[serde(default)]
    pub title: String,
    /// Planned start.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Planned finish.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Effort estimate in minutes.
    #[serde(default)]
    pub estimated_duration_minutes: Option<i64>,
    /// Owning project, used as the scheduling scope.
    #[serde(default)]
    pub project_id: Option<ScopeId>,
}

impl Task {
    /// Create an undated task with the given id.
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            start_date: None,
            due_date: None,
            estimated_duration_minutes: None,
            project_id: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_estimate_minutes(mut self, minutes: i64) -> Self {
        self.estimated_duration_minutes = Some(minutes);
        self
    }

    pub fn in_scope(mut self, scope: impl Into<ScopeId>) -> Self {
        self.project_id = Some(scope.into());
        self
    }

    /// The effort estimate as a duration; negative estimates count as zero.
    ///
    /// Returns `None` when the estimate is too large to represent.
    pub fn estimate(&self) -> Option<TimeDelta> {
        match self.estimated_duration_minutes {
            Some(m) => TimeDelta::try_minutes(m.max(0)),
            None => Some(TimeDelta::zero()),
        }
    }

    /// Whether the task carries any date at all.
    pub fn is_dated(&self) -> bool {
        self.start_date.is_some() || self.due_date.is_some()
    }

    /// Whether this task belongs to the given scope.
    pub fn belongs_to(&self, scope: &ScopeId) -> bool {
        self.project_id.as_ref() == Some(scope)
    }
}
