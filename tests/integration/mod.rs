//! Integration test suite for taskpath.
//!
//! These tests drive the scheduling core through `ScopeService`, the way
//! a host application would, and check the graph invariants with
//! property tests.
//!
//! # Test Categories
//!
//! - `scheduling_e2e`: Leveling and critical path scenarios end to end
//! - `mutation_gate`: Edge creation against in-memory and file stores
//! - `properties`: Acyclicity, leveling and CPM invariants (proptest)


mod mutation_gate;
mod properties;
