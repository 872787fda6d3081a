//! Scope-restricted dependency graph.
//!
//! `DependencyGraph` is rebuilt from a store snapshot on every request and
//! is never persisted. Nodes are the tasks of one scope; edges point from
//! predecessor to successor and carry the originating record.

use crate::core::edge::{DependencyEdge, DependencyType};
use crate::core::task::{Task, TaskId};
use crate::plog_debug;
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// The task dependency graph for one scope.
pub struct DependencyGraph {
    /// Predecessor -> successor edges, weighted with the stored record.
    graph: DiGraph<Task, DependencyEdge>,
    /// Index mapping from TaskId to NodeIndex for fast lookups.
    task_index: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Build the graph for a task subset.
    ///
    /// Edges whose endpoints are not both in `tasks` are dropped, as are
    /// self-loops and exact duplicates. Tasks listed twice keep their
    /// first occurrence.
    pub fn build(tasks: &[Task], edges: &[DependencyEdge]) -> Self {
        let mut dag = Self::new();
        for task in tasks {
            dag.add_task(task.clone());
        }

        let mut seen: HashSet<(&TaskId, &TaskId, DependencyType)> = HashSet::new();
        let mut dropped = 0usize;
        for edge in edges {
            if edge.is_self_loop() {
                plog_debug!("Dropping self-referential dependency {}", edge.id.short());
                dropped += 1;
                continue;
            }
            let (Some(&from), Some(&to)) = (
                dag.task_index.get(&edge.depends_on_task_id),
                dag.task_index.get(&edge.task_id),
            ) else {
                plog_debug!(
                    "Dropping out-of-scope dependency {} ({} -> {})",
                    edge.id.short(),
                    edge.depends_on_task_id,
                    edge.task_id
                );
                dropped += 1;
                continue;
            };
            if !seen.insert((&edge.depends_on_task_id, &edge.task_id, edge.dependency_type)) {
                dropped += 1;
                continue;
            }
            dag.graph.add_edge(from, to, edge.clone());
        }

        plog_debug!(
            "DependencyGraph::build tasks={} edges={} dropped={}",
            dag.task_count(),
            dag.edge_count(),
            dropped
        );
        dag
    }

    fn add_task(&mut self, task: Task) -> NodeIndex {
        if let Some(&index) = self.task_index.get(&task.id) {
            return index;
        }

        let id = task.id.clone();
        let index = self.graph.add_node(task);
        self.task_index.insert(id, index);
        index
    }

    /// Get a reference to a task by its ID.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.task_index
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    /// Task ids in the order the tasks were supplied.
    pub fn task_ids(&self) -> Vec<&TaskId> {
        self.graph.node_weights().map(|t| &t.id).collect()
    }

    /// All tasks in the order they were supplied.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.graph.node_weights()
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.task_index.contains_key(id)
    }

    /// Edges whose successor is `id`, in input order.
    pub fn predecessors(&self, id: &TaskId) -> Vec<&DependencyEdge> {
        self.edges_of(id, Direction::Incoming)
    }

    /// Edges whose predecessor is `id`, in input order.
    pub fn successors(&self, id: &TaskId) -> Vec<&DependencyEdge> {
        self.edges_of(id, Direction::Outgoing)
    }

    fn edges_of(&self, id: &TaskId, direction: Direction) -> Vec<&DependencyEdge> {
        let Some(&index) = self.task_index.get(id) else {
            return Vec::new();
        };
        self.directed_edges(index, direction)
            .into_iter()
            .map(|(_, edge)| edge)
            .collect()
    }

    /// Edges adjacent to `index` in `direction`, paired with the node at
    /// the other end, in insertion order.
    ///
    /// petgraph walks adjacency lists newest-first; sorting by edge index
    /// restores input order so downstream passes stay deterministic.
    pub(crate) fn directed_edges(
        &self,
        index: NodeIndex,
        direction: Direction,
    ) -> Vec<(NodeIndex, &DependencyEdge)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex, &DependencyEdge)> = self
            .graph
            .edges_directed(index, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                (e.id(), other, e.weight())
            })
            .collect();
        edges.sort_by_key(|(edge_index, _, _)| *edge_index);
        edges
            .into_iter()
            .map(|(_, other, edge)| (other, edge))
            .collect()
    }

    /// Whether `to` is reachable from `from` along predecessor -> successor edges.
    pub fn has_path(&self, from: &TaskId, to: &TaskId) -> bool {
        match (self.task_index.get(from), self.task_index.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Get the underlying graph for advanced operations.
    pub fn graph(&self) -> &DiGraph<Task, DependencyEdge> {
        &self.graph
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.edge_count())
            .finish()
    }
}
