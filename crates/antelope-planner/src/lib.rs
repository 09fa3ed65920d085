//! Dependency resolution and scheduling order (spec §4.4).
//!
//! Uses `petgraph` for the strict-import DAG and a deterministic topological
//! sort, rather than a full SAT-style version solver: a consumer's import is
//! matched against exactly the modules fetched for this project, not an
//! open universe of candidate versions to choose between.

mod planner;
mod types;

pub use planner::DependencyPlanner;
pub use types::{Plan, ProviderOutcome};
