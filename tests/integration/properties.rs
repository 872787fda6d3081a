//! Property tests for graph and schedule invariants.

use std::collections::HashSet;

use chrono::TimeDelta;
use proptest::prelude::*;

use taskpath::core::{DependencyType, EdgeCandidate, Task, TaskId};
use taskpath::schedule::{compute_levels, schedule_graph};
use taskpath::store::MemoryStore;
use taskpath::ScopeService;

use crate::fixtures::{dated_task, day, has_cycle, scope};

fn dependency_type_strategy() -> impl Strategy<Value = DependencyType> {
    prop_oneof![
        Just(DependencyType::FinishToStart),
        Just(DependencyType::StartToStart),
        Just(DependencyType::FinishToFinish),
        Just(DependencyType::StartToFinish),
    ]
}

/// Tasks (start day, length in days) and a sequence of candidate edges
/// given as indices into the task list.
fn scenario_strategy() -> impl Strategy<Value = (Vec<(i64, i64)>, Vec<(usize, usize, DependencyType)>)> {
    (1usize..12).prop_flat_map(|n| {
        (
            prop::collection::vec((0i64..5, 0i64..6), n),
            prop::collection::vec((0..n, 0..n, dependency_type_strategy()), 0..30),
        )
    })
}

/// Run every candidate through the mutation gate and return the service.
fn apply(
    tasks: &[(i64, i64)],
    candidates: &[(usize, usize, DependencyType)],
) -> ScopeService<MemoryStore> {
    let records: Vec<Task> = tasks
        .iter()
        .enumerate()
        .map(|(i, (start, len))| dated_task(&format!("t{}", i), *start, *len))
        .collect();
    let mut service = ScopeService::new(MemoryStore::with_records(records, Vec::new()));
    for (task, on, ty) in candidates {
        let candidate =
            EdgeCandidate::new(format!("t{}", task), format!("t{}", on)).with_type(*ty);
        // Rejections are expected; anything else is a store fault.
        let result = service.create_dependency_edge(&scope(), candidate);
        assert!(
            result.as_ref().map_or_else(|e| e.is_user_error(), |_| true),
            "unexpected error {:?}",
            result
        );
    }
    service
}

fn task_ids(service: &ScopeService<MemoryStore>) -> Vec<TaskId> {
    service
        .store()
        .snapshot()
        .tasks
        .iter()
        .map(|t| t.id.clone())
        .collect()
}

proptest! {
    /// Contract: any sequence of individually accepted edges stays acyclic.
    #[test]
    fn accepted_edges_never_form_a_cycle((tasks, candidates) in scenario_strategy()) {
        let service = apply(&tasks, &candidates);
        let edges = &service.store().snapshot().edges;
        prop_assert!(!has_cycle(&task_ids(&service), edges));
        prop_assert!(edges.iter().all(|e| !e.is_self_loop()));
    }

    /// Contract: every successor sits strictly right of its predecessor.
    #[test]
    fn levels_increase_along_edges((tasks, candidates) in scenario_strategy()) {
        let service = apply(&tasks, &candidates);
        let graph = service.graph(&scope()).unwrap();
        let levels = compute_levels(&graph);
        prop_assert!(levels.is_complete());
        prop_assert_eq!(levels.levels.len(), tasks.len());

        for edge in &service.store().snapshot().edges {
            let pred = levels.level(&edge.depends_on_task_id).unwrap();
            let succ = levels.level(&edge.task_id).unwrap();
            prop_assert!(succ > pred, "{} (level {}) -> {} (level {})",
                edge.depends_on_task_id, pred, edge.task_id, succ);
        }

        // Level 0 is exactly the set of tasks without predecessors.
        for id in graph.task_ids() {
            let is_root = graph.predecessors(id).is_empty();
            prop_assert_eq!(levels.level(id) == Some(0), is_root);
        }
    }

    /// Contract: CPM is a pure function of its input.
    #[test]
    fn schedule_is_deterministic((tasks, candidates) in scenario_strategy()) {
        let service = apply(&tasks, &candidates);
        let graph = service.graph(&scope()).unwrap();
        let first = schedule_graph(&graph, day(0)).unwrap();
        let second = schedule_graph(&graph, day(0)).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Contract: float is never negative, the critical set is non-empty,
    /// and every critical chain is a real path of zero-float tasks from a
    /// root to the project end.
    #[test]
    fn critical_chains_are_real_paths((tasks, candidates) in scenario_strategy()) {
        let service = apply(&tasks, &candidates);
        let graph = service.graph(&scope()).unwrap();
        let schedule = schedule_graph(&graph, day(0)).unwrap();

        prop_assert_eq!(schedule.nodes.len(), tasks.len());
        for node in &schedule.nodes {
            prop_assert!(node.float >= TimeDelta::zero());
            prop_assert_eq!(node.float, node.latest_finish - node.earliest_finish);
            prop_assert_eq!(node.is_critical, node.float == TimeDelta::zero());
            prop_assert!(schedule.project_end.map_or(false, |end| node.latest_finish <= end));
        }
        prop_assert!(!schedule.critical_path().is_empty());
        prop_assert!(!schedule.critical_chains.is_empty());

        let mut covered: HashSet<&TaskId> = HashSet::new();
        for chain in &schedule.critical_chains {
            for id in chain {
                prop_assert!(schedule.node(id).unwrap().is_critical);
                covered.insert(id);
            }
            for pair in chain.windows(2) {
                prop_assert!(graph.successors(&pair[0]).iter().any(|e| e.task_id == pair[1]));
            }

            // A chain runs from a scope root to a task finishing at the project end.
            let first = &chain[0];
            prop_assert!(graph.predecessors(first).is_empty(), "chain starts at {}", first);
            let last = schedule.node(&chain[chain.len() - 1]).unwrap();
            prop_assert_eq!(Some(last.earliest_finish), schedule.project_end);
        }
        // Every critical task lies on some reported chain.
        if schedule.critical_chains.len() < 256 {
            for node in schedule.critical_path() {
                prop_assert!(covered.contains(&node.task_id));
            }
        }
    }
}

