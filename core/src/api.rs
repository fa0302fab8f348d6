//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `veritree_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, find_config, load, load_file, AppConfig, LoadedConfig, LoggingConfig,
    RunConfig, CONFIG_FILE_NAMES,
};
pub use crate::error::{CliError, ExecutorError, RunnerError};
pub use crate::executor::graph::describe_dependencies;
pub use crate::executor::label::{format_duration, render_label};
pub use crate::executor::traits::{
    ExitCodeParser, LogVerbosity, OutputParserPlugin, ParsedOutput, RenderEvent, ReporterPlugin,
};
pub use crate::executor::{
    execute_tree, DependencyGraph, DependencyTracker, ExecutionEngine, ExecutionEngineBuilder,
    ExecutionOpts, RunResult, RunStats, TaskMetrics, TaskResult, UNKNOWN_ROOT_CAUSE,
};
pub use crate::runner::{execute_command, CommandOutcome, CommandRequest, ProcessHandle};
pub use crate::tree::{
    filter_tree, validate_tree, CommandSpec, RunSpec, Strategy, VerificationNode,
    VerificationTree,
};
