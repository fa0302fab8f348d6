//! Dependency-aware concurrent runner for trees of verification commands.
//!
//! Leaves run external commands, groups run their children in parallel,
//! sequentially or fail-fast, and declared reporting dependencies let a root
//! cause failure cancel and suppress the tasks downstream of it.

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod runner;
pub mod tree;
pub mod util;
