use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::executor::types::{RunResult, TaskResult};
use crate::tree::VerificationTree;

/// Which task logs are printed after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    All,
    #[default]
    Failed,
    None,
}

impl LogVerbosity {
    /// Whether `result`'s output should be printed.
    ///
    /// `Failed` shows genuine failures only; suppressed tasks are symptoms of
    /// a failure that is already shown.
    pub fn includes(self, result: &TaskResult) -> bool {
        match self {
            LogVerbosity::All => true,
            LogVerbosity::Failed => !result.ok && !result.suppressed,
            LogVerbosity::None => false,
        }
    }
}

impl FromStr for LogVerbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(LogVerbosity::All),
            "failed" => Ok(LogVerbosity::Failed),
            "none" => Ok(LogVerbosity::None),
            other => Err(format!("unknown log verbosity '{other}' (expected all, failed or none)")),
        }
    }
}

impl fmt::Display for LogVerbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogVerbosity::All => "all",
            LogVerbosity::Failed => "failed",
            LogVerbosity::None => "none",
        })
    }
}

/// Reporter plugin: owns all rendering of a run.
pub trait ReporterPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;

    /// Lifecycle callback. `TaskComplete` arrives exactly once per executed node.
    fn render(&self, event: &RenderEvent);

    /// Post-run task output, filtered by `verbosity`.
    fn output_logs(&self, results: &[TaskResult], verbosity: LogVerbosity);

    /// Post-run overall summary.
    fn output_summary(&self, result: &RunResult);
}

/// Lifecycle events emitted by the engine.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        tree: VerificationTree,
    },
    TaskStart {
        run_id: String,
        path: String,
        key: String,
    },
    TaskComplete {
        run_id: String,
        result: TaskResult,
    },
    RunEnd {
        run_id: String,
        result: RunResult,
    },
}
