use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::error::ExecutorError;
use crate::tree::{filter_tree, validate_tree, VerificationTree};

use super::scheduler::{TreeScheduler, UNKNOWN_ROOT_CAUSE};
use super::tracker::DependencyTracker;
use super::traits::{ExitCodeParser, LogVerbosity, OutputParserPlugin, RenderEvent, ReporterPlugin};
use super::types::{ExecutionOpts, RunResult, TaskResult};

/// Run coordinator: validates the tree, prepares the tracker, drives the
/// scheduler and assembles the run result.
pub struct ExecutionEngine {
    opts: ExecutionOpts,
    parser: Arc<dyn OutputParserPlugin>,
    reporter: Option<Arc<dyn ReporterPlugin>>,
    logs: LogVerbosity,
}

pub struct ExecutionEngineBuilder {
    opts: ExecutionOpts,
    parser: Option<Arc<dyn OutputParserPlugin>>,
    reporter: Option<Arc<dyn ReporterPlugin>>,
    logs: LogVerbosity,
}

impl ExecutionEngine {
    pub fn new(opts: ExecutionOpts) -> Self {
        Self {
            opts,
            parser: Arc::new(ExitCodeParser),
            reporter: None,
            logs: LogVerbosity::default(),
        }
    }

    pub fn builder(opts: ExecutionOpts) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(opts)
    }

    /// Execute the tree once.
    ///
    /// Only configuration errors (invalid nodes, cycles, strict-mode
    /// unresolved identifiers) are returned as `Err`, and always before any
    /// process is spawned. Task failures are part of the `RunResult`.
    #[tracing::instrument(name = "run", skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, tree: &VerificationTree) -> Result<RunResult, ExecutorError> {
        validate_tree(tree)?;
        let tracker = Arc::new(DependencyTracker::initialize(
            tree,
            self.opts.strict_dependencies,
        )?);

        let filtered = filter_tree(tree, &self.opts.filters);
        let mut scheduled = HashSet::new();
        filtered.walk(|path, _| {
            scheduled.insert(path.to_string());
        });
        tracker.settle_unscheduled(&scheduled);

        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        tracing::info!(
            tasks = scheduled.len(),
            filters = ?self.opts.filters,
            strategy = filtered.strategy.as_str(),
            "run started"
        );

        let started_at = Utc::now();
        let start = Instant::now();
        self.emit(RenderEvent::RunStart {
            run_id: run_id.clone(),
            tree: filtered.clone(),
        });

        let scheduler = TreeScheduler::new(
            run_id.clone(),
            tracker,
            self.parser.clone(),
            self.reporter.clone(),
            self.opts.max_parallel,
            self.opts.cwd.clone(),
            self.opts.capture_bytes,
        );
        let results = scheduler
            .run_nodes(&filtered.tasks, None, filtered.strategy)
            .await;

        let ok = run_ok(&results);
        let result = RunResult {
            run_id: run_id.clone(),
            ok,
            started_at,
            finished_at: Utc::now(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            results,
        };
        let stats = result.stats();
        tracing::info!(
            ok,
            passed = stats.passed,
            failed = stats.failed,
            suppressed = stats.suppressed,
            duration_ms = result.duration_ms,
            "run finished"
        );

        self.emit(RenderEvent::RunEnd {
            run_id,
            result: result.clone(),
        });
        if let Some(reporter) = &self.reporter {
            let leaves: Vec<TaskResult> = result
                .iter()
                .filter(|r| !r.is_group())
                .cloned()
                .collect();
            reporter.output_logs(&leaves, self.logs);
            reporter.output_summary(&result);
        }

        Ok(result)
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(reporter) = &self.reporter {
            reporter.render(&event);
        }
    }
}

/// A run passes when no task anywhere in the tree failed on its own account
/// and every suppression names a known root cause.
fn run_ok(results: &[TaskResult]) -> bool {
    results
        .iter()
        .flat_map(TaskResult::iter)
        .all(|r| r.is_non_blocking() && r.suppressed_by.as_deref() != Some(UNKNOWN_ROOT_CAUSE))
}

impl ExecutionEngineBuilder {
    pub fn new(opts: ExecutionOpts) -> Self {
        Self {
            opts,
            parser: None,
            reporter: None,
            logs: LogVerbosity::default(),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn OutputParserPlugin>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ReporterPlugin>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_logs(mut self, logs: LogVerbosity) -> Self {
        self.logs = logs;
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            opts: self.opts,
            parser: self.parser.unwrap_or_else(|| Arc::new(ExitCodeParser)),
            reporter: self.reporter,
            logs: self.logs,
        }
    }
}

/// Convenience wrapper: build an engine and run `tree` once.
pub async fn execute_tree(
    tree: &VerificationTree,
    opts: ExecutionOpts,
    parser: Option<Arc<dyn OutputParserPlugin>>,
    reporter: Option<Arc<dyn ReporterPlugin>>,
) -> Result<RunResult, ExecutorError> {
    let mut builder = ExecutionEngine::builder(opts);
    if let Some(parser) = parser {
        builder = builder.with_parser(parser);
    }
    if let Some(reporter) = reporter {
        builder = builder.with_reporter(reporter);
    }
    builder.build().run(tree).await
}
