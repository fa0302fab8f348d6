use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tokio::sync::Semaphore;

use super::label::apply_labels;
use super::tracker::DependencyTracker;
use super::traits::{OutputParserPlugin, RenderEvent, ReporterPlugin};
use super::types::TaskResult;
use crate::runner::{execute_command, CommandOutcome, CommandRequest};
use crate::tree::{join_path, CommandSpec, Strategy, VerificationNode};

/// Root cause reported when a terminated task cannot be attributed.
pub const UNKNOWN_ROOT_CAUSE: &str = "unknown";

/// Recursive tree walker. One per run; borrowed by every task future.
pub struct TreeScheduler {
    run_id: String,
    tracker: Arc<DependencyTracker>,
    parser: Arc<dyn OutputParserPlugin>,
    reporter: Option<Arc<dyn ReporterPlugin>>,
    limiter: Option<Arc<Semaphore>>,
    cwd: PathBuf,
    capture_bytes: usize,
}

impl TreeScheduler {
    pub fn new(
        run_id: impl Into<String>,
        tracker: Arc<DependencyTracker>,
        parser: Arc<dyn OutputParserPlugin>,
        reporter: Option<Arc<dyn ReporterPlugin>>,
        max_parallel: Option<usize>,
        cwd: PathBuf,
        capture_bytes: usize,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            tracker,
            parser,
            reporter,
            limiter: max_parallel.map(|n| Arc::new(Semaphore::new(n.max(1)))),
            cwd,
            capture_bytes,
        }
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(reporter) = &self.reporter {
            reporter.render(&event);
        }
    }

    /// Execute `nodes` (children of `parent`) under `strategy`.
    ///
    /// Results come back in declaration order. Under fail-fast, nodes after
    /// the first failure produce no result.
    pub fn run_nodes<'a>(
        &'a self,
        nodes: &'a [VerificationNode],
        parent: Option<&'a str>,
        strategy: Strategy,
    ) -> BoxFuture<'a, Vec<TaskResult>> {
        async move {
            match strategy {
                Strategy::Parallel => {
                    join_all(nodes.iter().map(|node| self.run_node(node, parent))).await
                }
                Strategy::Sequential => {
                    let mut results = Vec::with_capacity(nodes.len());
                    for node in nodes {
                        results.push(self.run_node(node, parent).await);
                    }
                    results
                }
                Strategy::FailFast => {
                    let mut results = Vec::with_capacity(nodes.len());
                    let mut remaining = nodes.iter();
                    for node in remaining.by_ref() {
                        let result = self.run_node(node, parent).await;
                        let failed = !result.ok;
                        results.push(result);
                        if failed {
                            break;
                        }
                    }
                    for skipped in remaining {
                        let path = join_path(parent, &skipped.key);
                        tracing::debug!(path = %path, "not started after earlier failure");
                        self.tracker.skip_subtree(&path);
                    }
                    results
                }
            }
        }
        .boxed()
    }

    fn run_node<'a>(
        &'a self,
        node: &'a VerificationNode,
        parent: Option<&'a str>,
    ) -> BoxFuture<'a, TaskResult> {
        async move {
            let path = join_path(parent, &node.key);
            self.emit(RenderEvent::TaskStart {
                run_id: self.run_id.clone(),
                path: path.clone(),
                key: node.key.clone(),
            });

            let mut result = if node.is_group() {
                self.run_group(node, &path).await
            } else if let Some(command) = node.run.as_ref().and_then(|r| r.to_command()) {
                self.run_leaf(node, &path, &command).await
            } else {
                TaskResult::no_op(&node.key, &path)
            };
            apply_labels(
                &mut result,
                node.success_label.as_deref(),
                node.failure_label.as_deref(),
            );

            self.tracker.record_result(&result);
            self.emit(RenderEvent::TaskComplete {
                run_id: self.run_id.clone(),
                result: result.clone(),
            });
            result
        }
        .boxed()
    }

    async fn run_group(&self, node: &VerificationNode, path: &str) -> TaskResult {
        let started = Instant::now();
        let children = self
            .run_nodes(node.children(), Some(path), node.strategy)
            .await;
        // A group is never suppressed on its own account: its dependencies
        // reach its children through `failed_dependency`, and a child that
        // failed genuinely keeps the group failed.
        aggregate(&node.key, path, children, elapsed_ms(started))
    }

    async fn run_leaf(&self, node: &VerificationNode, path: &str, command: &CommandSpec) -> TaskResult {
        let request = CommandRequest::from_spec(path, command, &self.cwd, self.capture_bytes);
        let outcome = {
            // The permit covers the process only, never a dependency wait.
            let _permit = match &self.limiter {
                Some(limiter) => limiter.clone().acquire_owned().await.ok(),
                None => None,
            };
            execute_command(&request, self.tracker.as_ref()).await
        };

        if outcome.was_terminated {
            return self.terminated_result(node, path, outcome).await;
        }

        let hint = node.run.as_ref().map(|r| r.hint());
        let parsed = self.parser.parse(
            &outcome.output,
            outcome.exit_code,
            node.parser.as_deref(),
            hint.as_deref(),
        );
        let mut result = TaskResult {
            key: node.key.clone(),
            path: path.to_string(),
            ok: outcome.exit_code == 0,
            code: outcome.exit_code,
            duration_ms: outcome.duration_ms,
            output: outcome.output,
            summary_line: parsed.summary,
            metrics: parsed.metrics,
            children: None,
            suppressed: false,
            suppressed_by: None,
        };
        self.attribute_failure(path, &mut result).await;
        result
    }

    /// A task that was cancelled: attribute it to the failure that caused it.
    async fn terminated_result(
        &self,
        node: &VerificationNode,
        path: &str,
        outcome: CommandOutcome,
    ) -> TaskResult {
        self.tracker.wait_for_dependencies(path).await;
        let cause = self
            .tracker
            .failed_dependency(path)
            .or_else(|| self.tracker.kill_cause(path))
            .unwrap_or_else(|| {
                tracing::warn!(path, "task was terminated but no failed dependency was recorded");
                UNKNOWN_ROOT_CAUSE.to_string()
            });

        let mut result = TaskResult {
            key: node.key.clone(),
            path: path.to_string(),
            ok: false,
            code: outcome.exit_code,
            duration_ms: outcome.duration_ms,
            output: outcome.output,
            summary_line: format!("terminated: {cause} failed"),
            metrics: None,
            children: None,
            suppressed: false,
            suppressed_by: None,
        };
        result.suppress(cause);
        result
    }

    /// Suppress a failure whose dependency also failed.
    ///
    /// Waits only for the leaf's own dependencies. Those declared on an
    /// enclosing group count if they have already failed by now.
    async fn attribute_failure(&self, path: &str, result: &mut TaskResult) {
        if self.tracker.has_dependencies(path) {
            self.tracker.wait_for_dependencies(path).await;
        }
        if result.ok || result.suppressed {
            return;
        }
        if let Some(cause) = self.tracker.failed_dependency(path) {
            tracing::debug!(path, cause = %cause, "suppressing failure caused by dependency");
            result.suppress(cause);
        }
    }
}

/// Fold child results into a group result.
pub fn aggregate(key: &str, path: &str, children: Vec<TaskResult>, duration_ms: u64) -> TaskResult {
    let ok = children.iter().all(TaskResult::is_non_blocking);
    let total = children.len();
    let passed = children.iter().filter(|c| c.ok).count();
    let suppressed = children.iter().filter(|c| c.suppressed).count();
    let failed = total - passed - suppressed;

    let mut summary_line = format!("{passed}/{total} passed");
    if failed > 0 {
        summary_line.push_str(&format!(", {failed} failed"));
    }
    if suppressed > 0 {
        summary_line.push_str(&format!(", {suppressed} suppressed"));
    }

    let inherited = (total > 0 && suppressed == total).then(|| {
        children[0]
            .suppressed_by
            .clone()
            .unwrap_or_else(|| UNKNOWN_ROOT_CAUSE.to_string())
    });

    let mut result = TaskResult {
        key: key.to_string(),
        path: path.to_string(),
        ok,
        code: if ok { 0 } else { 1 },
        duration_ms,
        output: String::new(),
        summary_line,
        metrics: None,
        children: Some(children),
        suppressed: false,
        suppressed_by: None,
    };
    if let Some(cause) = inherited {
        result.suppress(cause);
        result.code = 1;
    }
    result
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
