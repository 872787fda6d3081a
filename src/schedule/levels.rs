//! Topological leveling for diagram and chart layout.
//!
//! Levels are longest-path distances from a scope root: a task sits one
//! column to the right of its deepest predecessor. Computed with Kahn's
//! algorithm so tasks caught in a cycle are reported instead of looping.

use crate::core::graph::DependencyGraph;
use crate::core::task::TaskId;
use crate::error::{Error, Result};
use crate::{plog_debug, plog_warn};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Level per task, plus the order in which tasks were leveled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAssignment {
    /// Column index per task. Level 0 holds tasks without in-scope predecessors.
    pub levels: BTreeMap<TaskId, usize>,
    /// Processing order; a topological order of every leveled task.
    pub order: Vec<TaskId>,
    /// Tasks never released by the sort, i.e. on or behind a cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unleveled: Vec<TaskId>,
}

impl LevelAssignment {
    pub fn level(&self, id: &TaskId) -> Option<usize> {
        self.levels.get(id).copied()
    }

    pub fn max_level(&self) -> Option<usize> {
        self.levels.values().copied().max()
    }

    pub fn is_complete(&self) -> bool {
        self.unleveled.is_empty()
    }

    /// Fail with `CycleDetected` if any task could not be leveled.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(Error::CycleDetected {
                count: self.unleveled.len(),
                tasks: self.unleveled.clone(),
            })
        }
    }

    /// Tasks grouped by level, each column in processing order.
    pub fn columns(&self) -> Vec<Vec<TaskId>> {
        let mut columns: Vec<Vec<TaskId>> = vec![Vec::new(); self.max_level().map_or(0, |m| m + 1)];
        for id in &self.order {
            if let Some(level) = self.level(id) {
                columns[level].push(id.clone());
            }
        }
        columns
    }
}

/// Kahn's sort over the graph, returning the processing order, the level
/// of every node (indexed by `NodeIndex::index()`), and the nodes never dequeued.
pub(crate) fn kahn_order(
    graph: &DependencyGraph,
) -> (Vec<NodeIndex>, Vec<Option<usize>>, Vec<NodeIndex>) {
    let inner = graph.graph();
    let node_count = inner.node_count();

    let mut in_degree: Vec<usize> = inner
        .node_indices()
        .map(|i| inner.edges_directed(i, Direction::Incoming).count())
        .collect();
    let mut levels: Vec<Option<usize>> = vec![None; node_count];
    let mut tentative: Vec<usize> = vec![0; node_count];

    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    for index in inner.node_indices() {
        if in_degree[index.index()] == 0 {
            levels[index.index()] = Some(0);
            queue.push_back(index);
        }
    }

    let mut order = Vec::with_capacity(node_count);
    // Each node is enqueued at most once, so this is bounded by node_count.
    while let Some(index) = queue.pop_front() {
        let level = levels[index.index()].unwrap_or(0);
        order.push(index);

        for (successor, _) in graph.directed_edges(index, Direction::Outgoing) {
            let slot = successor.index();
            tentative[slot] = tentative[slot].max(level + 1);
            in_degree[slot] -= 1;
            if in_degree[slot] == 0 {
                levels[slot] = Some(tentative[slot]);
                queue.push_back(successor);
            }
        }
    }

    let unleveled: Vec<NodeIndex> = inner
        .node_indices()
        .filter(|i| levels[i.index()].is_none())
        .collect();
    (order, levels, unleveled)
}

/// Assign every task in the graph a layout level.
///
/// Tasks on a cycle never reach in-degree zero; they are listed in
/// `unleveled` rather than omitted.
pub fn compute_levels(graph: &DependencyGraph) -> LevelAssignment {
    let inner = graph.graph();
    let (order, levels, unleveled) = kahn_order(graph);

    let id_of = |index: NodeIndex| inner[index].id.clone();

    let assignment = LevelAssignment {
        levels: order
            .iter()
            .filter_map(|&i| levels[i.index()].map(|level| (id_of(i), level)))
            .collect(),
        order: order.iter().map(|&i| id_of(i)).collect(),
        unleveled: unleveled.iter().map(|&i| id_of(i)).collect(),
    };

    if assignment.is_complete() {
        plog_debug!(
            "compute_levels tasks={} max_level={:?}",
            assignment.order.len(),
            assignment.max_level()
        );
    } else {
        plog_warn!(
            "compute_levels: {} tasks could not be leveled (cycle in stored dependencies)",
            assignment.unleveled.len()
        );
    }
    assignment
}
