#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use veritree_core::api::{
    ExecutionEngine, ExecutionOpts, ExecutorError, LogVerbosity, RenderEvent, ReporterPlugin,
    RunResult, RunSpec, TaskResult, VerificationNode, VerificationTree,
};

/// Hard ceiling for any single run; a hang fails the test instead of the suite.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(20);

pub fn sh(key: &str, line: &str) -> VerificationNode {
    VerificationNode::leaf(key, RunSpec::Shell(line.to_string()))
}

pub fn opts(dir: &Path) -> ExecutionOpts {
    ExecutionOpts::default().with_cwd(dir)
}

pub async fn run_tree(
    tree: &VerificationTree,
    opts: ExecutionOpts,
) -> Result<RunResult, ExecutorError> {
    run_with_reporter(tree, opts, None).await
}

pub async fn run_with_reporter(
    tree: &VerificationTree,
    opts: ExecutionOpts,
    reporter: Option<Arc<dyn ReporterPlugin>>,
) -> Result<RunResult, ExecutorError> {
    let mut builder = ExecutionEngine::builder(opts);
    if let Some(reporter) = reporter {
        builder = builder.with_reporter(reporter);
    }
    let engine = builder.build();
    tokio::time::timeout(RUN_TIMEOUT, engine.run(tree))
        .await
        .expect("run did not finish in time")
}

pub fn leaf<'a>(result: &'a RunResult, path: &str) -> &'a TaskResult {
    result
        .find(path)
        .unwrap_or_else(|| panic!("no result for {path}"))
}

pub fn paths(result: &RunResult) -> Vec<String> {
    result.iter().map(|r| r.path.clone()).collect()
}

/// Reporter that records every callback as a short string.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ReporterPlugin for RecordingReporter {
    fn name(&self) -> &str {
        "recording"
    }

    fn format(&self) -> &str {
        "test"
    }

    fn render(&self, event: &RenderEvent) {
        let line = match event {
            RenderEvent::RunStart { .. } => "run.start".to_string(),
            RenderEvent::TaskStart { path, .. } => format!("start {path}"),
            RenderEvent::TaskComplete { result, .. } => format!("end {}", result.path),
            RenderEvent::RunEnd { .. } => "run.end".to_string(),
        };
        self.push(line);
    }

    fn output_logs(&self, results: &[TaskResult], verbosity: LogVerbosity) {
        for result in results.iter().filter(|r| verbosity.includes(r)) {
            self.push(format!("log {}", result.path));
        }
    }

    fn output_summary(&self, result: &RunResult) {
        self.push(format!("summary ok={}", result.ok));
    }
}
