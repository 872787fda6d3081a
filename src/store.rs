//! Task and dependency record stores.
//!
//! The scheduling core reads snapshots through `DependencyStore` and writes
//! one edge record at a time. `JsonFileStore` keeps the records in a single
//! JSON document on disk; `MemoryStore` backs tests and embedders.

use crate::core::edge::{DependencyEdge, EdgeId};
use crate::core::task::{ScopeId, Task};
use crate::{plog_debug, plog_error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Read and write access to task and dependency records.
pub trait DependencyStore {
    /// Tasks whose project is `scope`.
    fn list_tasks_in_scope(&self, scope: &ScopeId) -> Result<Vec<Task>>;

    /// Edges with at least one endpoint in `scope`. Callers filter further.
    fn list_dependency_edges(&self, scope: &ScopeId) -> Result<Vec<DependencyEdge>>;

    fn find_edge(&self, id: &EdgeId) -> Result<Option<DependencyEdge>>;

    fn insert_edge(&mut self, edge: DependencyEdge) -> Result<()>;

    /// Remove an edge; returns whether it existed.
    fn remove_edge(&mut self, id: &EdgeId) -> Result<bool>;
}

/// Serialized form of a store: every task and edge record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub edges: Vec<DependencyEdge>,
}

impl Snapshot {
    fn tasks_in_scope(&self, scope: &ScopeId) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.belongs_to(scope))
            .cloned()
            .collect()
    }

    fn edges_touching(&self, scope: &ScopeId) -> Vec<DependencyEdge> {
        let ids: HashSet<_> = self
            .tasks
            .iter()
            .filter(|t| t.belongs_to(scope))
            .map(|t| &t.id)
            .collect();
        self.edges
            .iter()
            .filter(|e| ids.contains(&e.task_id) || ids.contains(&e.depends_on_task_id))
            .cloned()
            .collect()
    }

    fn remove(&mut self, id: &EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| &e.id != id);
        self.edges.len() != before
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Snapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(tasks: Vec<Task>, edges: Vec<DependencyEdge>) -> Self {
        Self {
            snapshot: Snapshot { tasks, edges },
        }
    }

    pub fn add_task(&mut self, task: Task) {
        self.snapshot.tasks.push(task);
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl DependencyStore for MemoryStore {
    fn list_tasks_in_scope(&self, scope: &ScopeId) -> Result<Vec<Task>> {
        Ok(self.snapshot.tasks_in_scope(scope))
    }

    fn list_dependency_edges(&self, scope: &ScopeId) -> Result<Vec<DependencyEdge>> {
        Ok(self.snapshot.edges_touching(scope))
    }

    fn find_edge(&self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        Ok(self.snapshot.edges.iter().find(|e| &e.id == id).cloned())
    }

    fn insert_edge(&mut self, edge: DependencyEdge) -> Result<()> {
        self.snapshot.edges.push(edge);
        Ok(())
    }

    fn remove_edge(&mut self, id: &EdgeId) -> Result<bool> {
        Ok(self.snapshot.remove(id))
    }
}

/// Store backed by one JSON file, rewritten on each mutation.
///
/// The file is read fresh for every query so a long-lived store sees edits
/// made by other processes between calls.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current snapshot; a missing file is an empty store.
    pub fn load(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            plog_debug!("Store file {} not found, starting empty", self.path.display());
            return Ok(Snapshot::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the snapshot to a fresh temp file beside the store, then
    /// persist it over the store file.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(serde_json::to_string_pretty(snapshot)?.as_bytes())?;
        temp_file.flush()?;
        if let Err(e) = temp_file.persist(&self.path) {
            plog_error!("Failed to replace {}: {}", self.path.display(), e.error);
            return Err(e.error.into());
        }
        plog_debug!(
            "Store saved to {} ({} tasks, {} edges)",
            self.path.display(),
            snapshot.tasks.len(),
            snapshot.edges.len()
        );
        Ok(())
    }
}

impl DependencyStore for JsonFileStore {
    fn list_tasks_in_scope(&self, scope: &ScopeId) -> Result<Vec<Task>> {
        Ok(self.load()?.tasks_in_scope(scope))
    }

    fn list_dependency_edges(&self, scope: &ScopeId) -> Result<Vec<DependencyEdge>> {
        Ok(self.load()?.edges_touching(scope))
    }

    fn find_edge(&self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        Ok(self.load()?.edges.into_iter().find(|e| &e.id == id))
    }

    fn insert_edge(&mut self, edge: DependencyEdge) -> Result<()> {
        let mut snapshot = self.load()?;
        snapshot.edges.push(edge);
        self.save(&snapshot)
    }

    fn remove_edge(&mut self, id: &EdgeId) -> Result<bool> {
        let mut snapshot = self.load()?;
        let removed = snapshot.remove(id);
        if removed {
            self.save(&snapshot)?;
        }
        Ok(removed)
    }
}
