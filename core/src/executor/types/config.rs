use std::path::PathBuf;

use crate::runner::DEFAULT_CAPTURE_BYTES;

/// Options for one run of the execution engine.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Base working directory for every command
    pub cwd: PathBuf,

    /// Path filters; empty runs the whole tree
    pub filters: Vec<String>,

    /// Maximum concurrently running leaf processes (None = unbounded)
    pub max_parallel: Option<usize>,

    /// Bytes to capture from each task output (tail kept)
    pub capture_bytes: usize,

    /// Reject dependency identifiers that do not resolve
    pub strict_dependencies: bool,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self {
            cwd: PathBuf::from("."),
            filters: Vec::new(),
            max_parallel: None,
            capture_bytes: DEFAULT_CAPTURE_BYTES,
            strict_dependencies: false,
        }
    }
}

impl ExecutionOpts {
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.max_parallel = max_parallel.filter(|n| *n > 0);
        self
    }

    pub fn with_capture_bytes(mut self, capture_bytes: usize) -> Self {
        self.capture_bytes = capture_bytes.max(1);
        self
    }

    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }
}
