//! Nominal time windows derived from stored task dates.

use crate::core::task::{Task, TaskId};
use crate::{plog_debug, plog_warn};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nominal start and finish of a task before any dependency is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWindow {
    pub start: DateTime<Utc>,
    pub finish: DateTime<Utc>,
}

impl TaskWindow {
    pub fn new(start: DateTime<Utc>, finish: DateTime<Utc>) -> Self {
        Self { start, finish }
    }

    /// A zero-duration window at `at`.
    pub fn milestone(at: DateTime<Utc>) -> Self {
        Self {
            start: at,
            finish: at,
        }
    }

    /// Own duration; never negative.
    pub fn duration(&self) -> TimeDelta {
        (self.finish - self.start).max(TimeDelta::zero())
    }
}

/// Earliest date stored on any of the tasks.
pub fn earliest_known_date<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Option<DateTime<Utc>> {
    tasks
        .into_iter()
        .flat_map(|t| [t.start_date, t.due_date])
        .flatten()
        .min()
}

/// Derive a nominal window for one task.
///
/// - start and due: used as is; a due date before the start collapses to a
///   milestone at the start
/// - start only: finish is start plus the estimate
/// - due only: start is due minus the estimate
/// - no dates: a milestone at `anchor`
///
/// An estimate that pushes the other end out of the representable date
/// range collapses to a milestone at the stored date.
pub fn derive_window(task: &Task, anchor: DateTime<Utc>) -> TaskWindow {
    match (task.start_date, task.due_date) {
        (Some(start), Some(due)) => {
            if due < start {
                plog_debug!("Task {} is due before it starts; treating as milestone", task.id);
                TaskWindow::milestone(start)
            } else {
                TaskWindow::new(start, due)
            }
        }
        (Some(start), None) => match task.estimate().and_then(|d| start.checked_add_signed(d)) {
            Some(finish) => TaskWindow::new(start, finish),
            None => {
                plog_warn!("Task {} estimate overflows the calendar; treating as milestone", task.id);
                TaskWindow::milestone(start)
            }
        },
        (None, Some(due)) => match task.estimate().and_then(|d| due.checked_sub_signed(d)) {
            Some(start) => TaskWindow::new(start, due),
            None => {
                plog_warn!("Task {} estimate overflows the calendar; treating as milestone", task.id);
                TaskWindow::milestone(due)
            }
        },
        (None, None) => TaskWindow::milestone(anchor),
    }
}

/// Derive windows for every task of a scope.
///
/// Undated tasks are anchored at the scope's earliest known date, or at
/// `fallback_anchor` when no task in the scope carries a date.
pub fn derive_windows<'a>(
    tasks: impl IntoIterator<Item = &'a Task> + Clone,
    fallback_anchor: DateTime<Utc>,
) -> HashMap<TaskId, TaskWindow> {
    let anchor = earliest_known_date(tasks.clone()).unwrap_or(fallback_anchor);
    tasks
        .into_iter()
        .map(|task| (task.id.clone(), derive_window(task, anchor)))
        .collect()
}
