//! Scope-level entry points wiring the store to the scheduling core.
//!
//! Every call takes an explicit `ScopeId` and rebuilds the scope graph from
//! a fresh snapshot. Mutations take `&mut self`, so one service instance
//! runs check-then-persist for one edge at a time.

use crate::core::edge::{EdgeCandidate, EdgeId};
use crate::core::graph::DependencyGraph;
use crate::core::task::ScopeId;
use crate::error::{Error, Result};
use crate::schedule::{check_edge, compute_levels, schedule_graph, LevelAssignment, Schedule};
use crate::store::DependencyStore;
use crate::{plog, plog_warn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Layout levels and schedule for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeReport {
    pub scope: ScopeId,
    pub levels: LevelAssignment,
    /// `None` when the stored dependencies contain a cycle.
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ScopeReport {
    pub fn is_degraded(&self) -> bool {
        self.schedule.is_none()
    }
}

pub struct ScopeService<S> {
    store: S,
}

impl<S: DependencyStore> ScopeService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build the graph for `scope` from the current records.
    pub fn graph(&self, scope: &ScopeId) -> Result<DependencyGraph> {
        let tasks = self.store.list_tasks_in_scope(scope)?;
        let edges = self.store.list_dependency_edges(scope)?;
        Ok(DependencyGraph::build(&tasks, &edges))
    }

    /// Persist `candidate` if it keeps the scope acyclic.
    ///
    /// # Errors
    /// - `InvalidEdge` for a self-referential candidate
    /// - `DuplicateEdge` if the same pair is already linked
    /// - `RejectedCycle` if the edge would close a cycle
    /// - storage errors from the underlying store
    pub fn create_dependency_edge(
        &mut self,
        scope: &ScopeId,
        candidate: EdgeCandidate,
    ) -> Result<EdgeId> {
        let graph = self.graph(scope)?;
        check_edge(&graph, &candidate)?;

        let duplicate = graph
            .predecessors(&candidate.task_id)
            .iter()
            .any(|e| e.depends_on_task_id == candidate.depends_on_task_id);
        if duplicate {
            return Err(Error::DuplicateEdge {
                task_id: candidate.task_id,
                depends_on: candidate.depends_on_task_id,
            });
        }

        let edge = candidate.into_edge();
        let id = edge.id;
        plog!(
            "Creating dependency {} in {}: {} -> {} ({})",
            id.short(),
            scope,
            edge.depends_on_task_id,
            edge.task_id,
            edge.dependency_type
        );
        self.store.insert_edge(edge)?;
        Ok(id)
    }

    /// Delete a dependency record.
    pub fn remove_dependency_edge(&mut self, id: &EdgeId) -> Result<()> {
        if self.store.remove_edge(id)? {
            plog!("Removed dependency {}", id.short());
            Ok(())
        } else {
            Err(Error::EdgeNotFound(*id))
        }
    }

    pub fn levels(&self, scope: &ScopeId) -> Result<LevelAssignment> {
        Ok(compute_levels(&self.graph(scope)?))
    }

    /// Run CPM for `scope`. Undated scopes are anchored at `now`.
    pub fn schedule(&self, scope: &ScopeId, now: DateTime<Utc>) -> Result<Schedule> {
        schedule_graph(&self.graph(scope)?, now)
    }

    /// Levels and schedule together.
    ///
    /// A cycle in stored data does not fail the report: levels are returned
    /// with the affected tasks in `unleveled`, and the schedule is omitted
    /// with a warning.
    pub fn scope_report(&self, scope: &ScopeId, now: DateTime<Utc>) -> Result<ScopeReport> {
        let graph = self.graph(scope)?;
        let levels = compute_levels(&graph);

        let mut warnings = Vec::new();
        let schedule = match schedule_graph(&graph, now) {
            Ok(schedule) => Some(schedule),
            Err(Error::CycleDetected { count, .. }) => {
                let message = format!("schedule could not be computed for {} tasks", count);
                plog_warn!("Scope {}: {}", scope, message);
                warnings.push(message);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(ScopeReport {
            scope: scope.clone(),
            levels,
            schedule,
            warnings,
        })
    }
}
