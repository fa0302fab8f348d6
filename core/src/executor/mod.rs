//! Dependency-aware execution of verification trees.
//!
//! # Architecture
//!
//! ```text
//! VerificationTree
//!   ↓
//! validate_tree() → DependencyTracker::initialize() → DependencyGraph::build()
//!   ↓                                   (resolve identifiers, reject cycles)
//! filter_tree()
//!   ↓
//! TreeScheduler::run_nodes()  (recursive; parallel / sequential / fail-fast)
//!   ├─ group → run_nodes() → aggregate()
//!   └─ leaf  → execute_command() ⇄ DependencyTracker (register / kill / wait)
//!   ↓
//! RunResult
//! ```

mod engine;
pub mod graph;
pub mod label;
mod scheduler;
mod tracker;
pub mod traits;
pub mod types;

pub use engine::{execute_tree, ExecutionEngine, ExecutionEngineBuilder};
pub use graph::{DependencyGraph, Resolution};
pub use scheduler::{aggregate, TreeScheduler, UNKNOWN_ROOT_CAUSE};
pub use tracker::DependencyTracker;
pub use types::{ExecutionOpts, RunResult, RunStats, TaskMetrics, TaskResult};
