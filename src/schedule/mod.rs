//! Pure scheduling computations over a `DependencyGraph`.
//!
//! Nothing here performs I/O or holds state between calls; each function
//! receives its own graph snapshot and returns a fresh result.

pub mod critical_path;
pub mod guard;
pub mod levels;
pub mod window;

pub use critical_path::{compute_critical_path, schedule_graph, Schedule, ScheduleNode};
pub use guard::{can_add_edge, check_edge};
pub use levels::{compute_levels, LevelAssignment};
pub use window::{derive_window, derive_windows, TaskWindow};
