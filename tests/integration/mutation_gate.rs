//! Edge creation through the mutation gate against real stores.

use tempfile::TempDir;

use taskpath::core::{DependencyEdge, DependencyType, EdgeCandidate, Task};
use taskpath::store::{DependencyStore, JsonFileStore, Snapshot};
use taskpath::{Error, ScopeService};

use crate::fixtures::{dated_task, day, scope};

fn file_service(dir: &TempDir, tasks: Vec<Task>) -> ScopeService<JsonFileStore> {
    let store = JsonFileStore::new(dir.path().join("tasks.json"));
    store
        .save(&Snapshot {
            tasks,
            edges: Vec::new(),
        })
        .unwrap();
    ScopeService::new(store)
}

#[test]
fn test_file_store_accepts_and_persists() {
    let dir = TempDir::new().unwrap();
    let mut service = file_service(&dir, vec![dated_task("a", 0, 1), dated_task("b", 0, 1)]);

    let id = service
        .create_dependency_edge(
            &scope(),
            EdgeCandidate::new("b", "a").with_type(DependencyType::StartToStart),
        )
        .unwrap();

    // A second handle on the same file sees the record.
    let reopened = JsonFileStore::new(dir.path().join("tasks.json"));
    let edge = reopened.find_edge(&id).unwrap().unwrap();
    assert_eq!(edge.task_id.as_str(), "b");
    assert_eq!(edge.depends_on_task_id.as_str(), "a");
    assert_eq!(edge.dependency_type, DependencyType::StartToStart);

    let raw = std::fs::read_to_string(dir.path().join("tasks.json")).unwrap();
    assert!(raw.contains("\"dependsOnTaskId\": \"a\""));
    assert!(raw.contains("start-to-start"));
}

#[test]
fn test_file_store_rejection_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let mut service = file_service(
        &dir,
        vec![dated_task("a", 0, 1), dated_task("b", 0, 1), dated_task("c", 0, 1)],
    );
    service
        .create_dependency_edge(&scope(), EdgeCandidate::new("b", "a"))
        .unwrap();
    service
        .create_dependency_edge(&scope(), EdgeCandidate::new("c", "b"))
        .unwrap();
    let before = std::fs::read_to_string(dir.path().join("tasks.json")).unwrap();

    for candidate in [
        EdgeCandidate::new("a", "c"),
        EdgeCandidate::new("a", "b").with_type(DependencyType::FinishToFinish),
        EdgeCandidate::new("b", "b"),
        EdgeCandidate::new("c", "b"),
    ] {
        let err = service
            .create_dependency_edge(&scope(), candidate)
            .unwrap_err();
        assert!(err.is_user_error(), "unexpected error {:?}", err);
    }

    let after = std::fs::read_to_string(dir.path().join("tasks.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_imported_cycle_degrades_report() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("tasks.json"));
    // Records written by another tool, bypassing the guard.
    store
        .save(&Snapshot {
            tasks: vec![
                dated_task("a", 0, 1),
                dated_task("b", 0, 1),
                dated_task("c", 0, 1),
                dated_task("d", 0, 1),
            ],
            edges: vec![
                DependencyEdge::new("b", "a", DependencyType::FinishToStart),
                DependencyEdge::new("c", "b", DependencyType::FinishToStart),
                DependencyEdge::new("b", "c", DependencyType::StartToStart),
            ],
        })
        .unwrap();
    let service = ScopeService::new(store);

    let report = service.scope_report(&scope(), day(0)).unwrap();
    assert!(report.is_degraded());
    assert_eq!(report.levels.level(&"a".into()), Some(0));
    assert_eq!(report.levels.level(&"d".into()), Some(0));
    assert_eq!(report.levels.unleveled.len(), 2);
    assert_eq!(report.warnings.len(), 1);

    let err = service.schedule(&scope(), day(0)).unwrap_err();
    assert!(matches!(err, Error::CycleDetected { count: 2, .. }));
    assert!(!err.is_user_error());
}

#[test]
fn test_remove_then_relink_reverse_direction() {
    let dir = TempDir::new().unwrap();
    let mut service = file_service(&dir, vec![dated_task("a", 0, 1), dated_task("b", 0, 1)]);
    let id = service
        .create_dependency_edge(&scope(), EdgeCandidate::new("b", "a"))
        .unwrap();
    assert!(matches!(
        service.create_dependency_edge(&scope(), EdgeCandidate::new("a", "b")),
        Err(Error::RejectedCycle { .. })
    ));

    service.remove_dependency_edge(&id).unwrap();
    service
        .create_dependency_edge(&scope(), EdgeCandidate::new("a", "b"))
        .unwrap();

    let levels = service.levels(&scope()).unwrap();
    assert_eq!(levels.level(&"b".into()), Some(0));
    assert_eq!(levels.level(&"a".into()), Some(1));
}
