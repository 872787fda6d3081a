//! Cycle guard for dependency mutations.
//!
//! A candidate edge `task_id depends on depends_on_task_id` closes a cycle
//! exactly when `depends_on_task_id` is already reachable from `task_id`
//! through successor edges. The check runs against the graph as persisted,
//! without the candidate.

use crate::core::edge::EdgeCandidate;
use crate::core::graph::DependencyGraph;
use crate::error::{Error, Result};
use crate::{plog, plog_debug};

/// Whether `candidate` can be persisted without creating a cycle.
///
/// Self-loops are rejected without a search. Candidates naming a task the
/// graph does not know are accepted; existence is the store's concern.
pub fn can_add_edge(graph: &DependencyGraph, candidate: &EdgeCandidate) -> bool {
    if candidate.is_self_loop() {
        return false;
    }
    if !graph.contains(&candidate.task_id) || !graph.contains(&candidate.depends_on_task_id) {
        return true;
    }
    // Search from the new successor: if it already leads to the new
    // predecessor, the edge would close the loop.
    !graph.has_path(&candidate.task_id, &candidate.depends_on_task_id)
}

/// Like `can_add_edge`, but reports why the candidate was refused.
///
/// # Errors
/// - `InvalidEdge` if the candidate is self-referential
/// - `RejectedCycle` if the candidate would close a cycle
pub fn check_edge(graph: &DependencyGraph, candidate: &EdgeCandidate) -> Result<()> {
    if candidate.is_self_loop() {
        plog!("Rejected self-referential dependency on {}", candidate.task_id);
        return Err(Error::InvalidEdge {
            task_id: candidate.task_id.clone(),
        });
    }
    if !can_add_edge(graph, candidate) {
        plog!(
            "Rejected dependency {} -> {}: would create a cycle",
            candidate.depends_on_task_id,
            candidate.task_id
        );
        return Err(Error::RejectedCycle {
            task_id: candidate.task_id.clone(),
            depends_on: candidate.depends_on_task_id.clone(),
        });
    }
    plog_debug!(
        "Accepted dependency {} -> {} ({})",
        candidate.depends_on_task_id,
        candidate.task_id,
        candidate.dependency_type
    );
    Ok(())
}
