use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Counts extracted from a tool's output by an output parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Duration the tool itself reported, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<u64>,
}

impl TaskMetrics {
    pub fn is_empty(&self) -> bool {
        self == &TaskMetrics::default()
    }
}

/// Result of executing a single node of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub key: String,
    pub path: String,
    pub ok: bool,
    /// Exit code (groups: 0 when ok, 1 otherwise)
    pub code: i32,
    pub duration_ms: u64,
    /// Captured output (tail-truncated)
    #[serde(default)]
    pub output: String,
    pub summary_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TaskMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TaskResult>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub suppressed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressed_by: Option<String>,
}

impl TaskResult {
    /// Zero-duration passing result for a node with nothing to run.
    pub fn no_op(key: &str, path: &str) -> Self {
        Self {
            key: key.to_string(),
            path: path.to_string(),
            ok: true,
            code: 0,
            duration_ms: 0,
            output: String::new(),
            summary_line: "no-op".to_string(),
            metrics: None,
            children: None,
            suppressed: false,
            suppressed_by: None,
        }
    }

    /// Mark this failure as a consequence of `cause`.
    pub fn suppress(&mut self, cause: impl Into<String>) {
        self.ok = false;
        self.suppressed = true;
        self.suppressed_by = Some(cause.into());
    }

    /// A result that does not make its parent (or the run) fail.
    pub fn is_non_blocking(&self) -> bool {
        self.ok || self.suppressed
    }

    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }

    /// Depth-first iterator over this result and all nested results.
    pub fn iter(&self) -> impl Iterator<Item = &TaskResult> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            if let Some(children) = &next.children {
                stack.extend(children.iter().rev());
            }
            Some(next)
        })
    }
}

/// Leaf counts over a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub suppressed: usize,
}

/// Result of one run over a verification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub ok: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub results: Vec<TaskResult>,
}

impl RunResult {
    /// Every result in the run, depth-first in tree order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().flat_map(TaskResult::iter)
    }

    pub fn find(&self, path: &str) -> Option<&TaskResult> {
        self.iter().find(|r| r.path == path)
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        for result in self.iter().filter(|r| !r.is_group()) {
            stats.total += 1;
            if result.ok {
                stats.passed += 1;
            } else if result.suppressed {
                stats.suppressed += 1;
            } else {
                stats.failed += 1;
            }
        }
        stats
    }
}
