pub mod config;
pub mod error;
pub mod log;

pub mod core;
pub mod schedule;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use service::{ScopeReport, ScopeService};
