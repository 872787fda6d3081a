//! Critical Path Method over a scope's dependency graph.
//!
//! The forward pass walks the topological order and pushes every task as
//! early as its incoming constraints allow; the backward pass walks the
//! reverse order and holds every task as late as its outgoing constraints
//! and the project end allow. The gap between the two is the task's float.
//!
//! Per dependency type, where `d` is the duration of the task being placed
//! (the successor going forward, the predecessor going backward):
//!
//! | type | forward: successor start ≥ | backward: predecessor finish ≤ |
//! |------|----------------------------|--------------------------------|
//! | finish-to-start  | pred EF     | succ LS     |
//! | start-to-start   | pred ES     | succ LS + d |
//! | finish-to-finish | pred EF − d | succ LF     |
//! | start-to-finish  | pred ES − d | succ LF + d |

use crate::core::edge::DependencyType;
use crate::core::graph::DependencyGraph;
use crate::core::task::TaskId;
use crate::error::{Error, Result};
use crate::schedule::levels::kahn_order;
use crate::schedule::window::{derive_windows, TaskWindow};
use crate::{plog_debug, plog_trace, plog_warn};
use chrono::{DateTime, TimeDelta, Utc};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on enumerated critical chains; lattices of parallel critical
/// branches grow exponentially.
const MAX_CRITICAL_CHAINS: usize = 256;

/// Serialize a `TimeDelta` as whole minutes.
mod minutes {
    use chrono::TimeDelta;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_minutes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let minutes = i64::deserialize(deserializer)?;
        TimeDelta::try_minutes(minutes)
            .ok_or_else(|| D::Error::custom(format!("{} minutes is out of range", minutes)))
    }
}

/// CPM result for a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleNode {
    pub task_id: TaskId,
    pub earliest_start: DateTime<Utc>,
    pub earliest_finish: DateTime<Utc>,
    pub latest_start: DateTime<Utc>,
    pub latest_finish: DateTime<Utc>,
    /// Own duration, in minutes when serialized.
    #[serde(with = "minutes")]
    pub duration: TimeDelta,
    /// Slack: how far the start can slip without moving the project end.
    #[serde(with = "minutes")]
    pub float: TimeDelta,
    pub is_critical: bool,
}

/// Output of one CPM run over a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// One node per task, in topological order.
    pub nodes: Vec<ScheduleNode>,
    pub project_start: Option<DateTime<Utc>>,
    pub project_end: Option<DateTime<Utc>>,
    /// Maximal chains of critical tasks linked by binding constraints.
    pub critical_chains: Vec<Vec<TaskId>>,
}

impl Schedule {
    pub fn node(&self, id: &TaskId) -> Option<&ScheduleNode> {
        self.nodes.iter().find(|n| &n.task_id == id)
    }

    /// Zero-float tasks ordered by earliest start, ties in topological order.
    pub fn critical_path(&self) -> Vec<&ScheduleNode> {
        let mut critical: Vec<&ScheduleNode> = self.nodes.iter().filter(|n| n.is_critical).collect();
        critical.sort_by_key(|n| n.earliest_start);
        critical
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// `at + delta`, clamped to the representable date range.
fn offset(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Lower bound on the successor's start imposed by one incoming edge.
fn start_bound(
    dependency_type: DependencyType,
    pred_start: DateTime<Utc>,
    pred_finish: DateTime<Utc>,
    own_duration: TimeDelta,
) -> DateTime<Utc> {
    match dependency_type {
        DependencyType::FinishToStart => pred_finish,
        DependencyType::StartToStart => pred_start,
        DependencyType::FinishToFinish => offset(pred_finish, -own_duration),
        DependencyType::StartToFinish => offset(pred_start, -own_duration),
    }
}

/// Upper bound on the predecessor's finish imposed by one outgoing edge.
fn finish_bound(
    dependency_type: DependencyType,
    succ_latest_start: DateTime<Utc>,
    succ_latest_finish: DateTime<Utc>,
    own_duration: TimeDelta,
) -> DateTime<Utc> {
    match dependency_type {
        DependencyType::FinishToStart => succ_latest_start,
        DependencyType::StartToStart => offset(succ_latest_start, own_duration),
        DependencyType::FinishToFinish => succ_latest_finish,
        DependencyType::StartToFinish => offset(succ_latest_finish, own_duration),
    }
}

/// Run the forward and backward passes over `graph`.
///
/// Tasks missing from `windows` are treated as milestones at the earliest
/// window start supplied (or the Unix epoch if none was).
///
/// # Errors
/// Returns `CycleDetected` if the graph contains a cycle; the topological
/// pass never visits more than the number of tasks.
pub fn compute_critical_path(
    graph: &DependencyGraph,
    windows: &HashMap<TaskId, TaskWindow>,
) -> Result<Schedule> {
    let inner = graph.graph();
    let (order, _, unleveled) = kahn_order(graph);
    if !unleveled.is_empty() {
        let tasks: Vec<TaskId> = unleveled.iter().map(|&i| inner[i].id.clone()).collect();
        plog_warn!(
            "compute_critical_path: cycle detected, schedule could not be computed for {} tasks",
            tasks.len()
        );
        return Err(Error::CycleDetected {
            count: tasks.len(),
            tasks,
        });
    }
    if order.is_empty() {
        return Ok(Schedule::default());
    }

    let anchor = windows
        .values()
        .map(|w| w.start)
        .min()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let node_windows: Vec<TaskWindow> = inner
        .node_indices()
        .map(|i| {
            windows
                .get(&inner[i].id)
                .copied()
                .unwrap_or_else(|| TaskWindow::milestone(anchor))
        })
        .collect();
    let duration = |i: NodeIndex| node_windows[i.index()].duration();

    let n = inner.node_count();
    let mut es = vec![anchor; n];
    let mut ef = vec![anchor; n];
    let mut ls = vec![anchor; n];
    let mut lf = vec![anchor; n];

    // Forward pass
    for &i in &order {
        let d = duration(i);
        let start = graph
            .directed_edges(i, Direction::Incoming)
            .into_iter()
            .map(|(p, edge)| start_bound(edge.dependency_type, es[p.index()], ef[p.index()], d))
            .max()
            .unwrap_or(node_windows[i.index()].start);
        es[i.index()] = start;
        ef[i.index()] = offset(start, d);
        plog_trace!("forward {} es={} ef={}", inner[i].id, es[i.index()], ef[i.index()]);
    }

    let project_start = order.iter().map(|i| es[i.index()]).min().unwrap_or(anchor);
    let project_end = order.iter().map(|i| ef[i.index()]).max().unwrap_or(anchor);

    // Backward pass; no task may finish after the project end.
    for &i in order.iter().rev() {
        let d = duration(i);
        let finish = graph
            .directed_edges(i, Direction::Outgoing)
            .into_iter()
            .map(|(s, edge)| finish_bound(edge.dependency_type, ls[s.index()], lf[s.index()], d))
            .fold(project_end, |acc, bound| acc.min(bound));
        lf[i.index()] = finish;
        ls[i.index()] = offset(finish, -d);
        plog_trace!("backward {} ls={} lf={}", inner[i].id, ls[i.index()], lf[i.index()]);
    }

    let nodes: Vec<ScheduleNode> = order
        .iter()
        .map(|&i| {
            let slot = i.index();
            let float = ls[slot] - es[slot];
            ScheduleNode {
                task_id: inner[i].id.clone(),
                earliest_start: es[slot],
                earliest_finish: ef[slot],
                latest_start: ls[slot],
                latest_finish: lf[slot],
                duration: duration(i),
                float,
                is_critical: float == TimeDelta::zero(),
            }
        })
        .collect();

    let critical_chains = trace_chains(graph, &order, &nodes, &es, &duration);

    plog_debug!(
        "compute_critical_path tasks={} critical={} chains={} end={}",
        nodes.len(),
        nodes.iter().filter(|n| n.is_critical).count(),
        critical_chains.len(),
        project_end
    );

    Ok(Schedule {
        nodes,
        project_start: Some(project_start),
        project_end: Some(project_end),
        critical_chains,
    })
}

/// Derive windows from the graph's own tasks and run the passes.
pub fn schedule_graph(graph: &DependencyGraph, fallback_anchor: DateTime<Utc>) -> Result<Schedule> {
    let tasks: Vec<_> = graph.tasks().collect();
    let windows = derive_windows(tasks.iter().copied(), fallback_anchor);
    compute_critical_path(graph, &windows)
}

/// Enumerate maximal paths through critical tasks along binding edges.
///
/// An edge binds when its start bound equals the successor's earliest
/// start, i.e. it is the constraint that placed the successor.
fn trace_chains(
    graph: &DependencyGraph,
    order: &[NodeIndex],
    nodes: &[ScheduleNode],
    es: &[DateTime<Utc>],
    duration: &dyn Fn(NodeIndex) -> TimeDelta,
) -> Vec<Vec<TaskId>> {
    let inner = graph.graph();
    let critical: HashMap<NodeIndex, bool> = order
        .iter()
        .zip(nodes)
        .map(|(&i, node)| (i, node.is_critical))
        .collect();
    let is_critical = |i: NodeIndex| critical.get(&i).copied().unwrap_or(false);
    let ef = |i: NodeIndex| offset(es[i.index()], duration(i));

    let binding_successors = |i: NodeIndex| -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = Vec::new();
        for (s, edge) in graph.directed_edges(i, Direction::Outgoing) {
            if !is_critical(s) || next.contains(&s) {
                continue;
            }
            let bound = start_bound(edge.dependency_type, es[i.index()], ef(i), duration(s));
            if bound == es[s.index()] {
                next.push(s);
            }
        }
        next
    };
    let has_binding_predecessor = |i: NodeIndex| {
        graph
            .directed_edges(i, Direction::Incoming)
            .into_iter()
            .any(|(p, _)| is_critical(p) && binding_successors(p).contains(&i))
    };

    let mut chains: Vec<Vec<TaskId>> = Vec::new();
    let mut stack: Vec<Vec<NodeIndex>> = order
        .iter()
        .rev()
        .filter(|&&i| is_critical(i) && !has_binding_predecessor(i))
        .map(|&i| vec![i])
        .collect();

    while let Some(path) = stack.pop() {
        if chains.len() >= MAX_CRITICAL_CHAINS {
            plog_warn!(
                "Critical chain enumeration stopped at {} chains",
                MAX_CRITICAL_CHAINS
            );
            break;
        }
        let Some(&last) = path.last() else {
            continue;
        };
        let next = binding_successors(last);
        if next.is_empty() {
            chains.push(path.iter().map(|&i| inner[i].id.clone()).collect());
            continue;
        }
        for &s in next.iter().rev() {
            let mut extended = path.clone();
            extended.push(s);
            stack.push(extended);
        }
    }
    chains
}
