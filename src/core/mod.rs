//! Core domain models for dependency scheduling.
//!
//! Tasks and dependency edges as read from the record store, and the
//! scope-restricted graph built from them.

pub mod edge;
pub mod graph;
pub mod task;

pub use edge::{DependencyEdge, DependencyType, EdgeCandidate, EdgeId};
pub use graph::DependencyGraph;
pub use task::{ScopeId, Task, TaskId};
