use chrono::Local;
use serde_json::{json, Value};
use veritree_core::executor::traits::{LogVerbosity, RenderEvent, ReporterPlugin};
use veritree_core::executor::{RunResult, TaskResult};

/// One JSON object per line on stdout, for CI and other tooling.
pub struct JsonlReporter {
    pretty_print: bool,
}

impl JsonlReporter {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart { run_id, tree } => {
                let mut tasks = Vec::new();
                tree.walk(|path, _| tasks.push(path.to_string()));
                json!({
                    "v": 1,
                    "event_type": "run.start",
                    "ts": ts,
                    "run_id": run_id,
                    "metadata": {
                        "strategy": tree.strategy.as_str(),
                        "tasks": tasks,
                    }
                })
            }
            RenderEvent::TaskStart { run_id, path, key } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "path": path,
                "key": key,
            }),
            RenderEvent::TaskComplete { run_id, result } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "path": result.path,
                "key": result.key,
                "metadata": {
                    "ok": result.ok,
                    "code": result.code,
                    "group": result.is_group(),
                    "duration_ms": result.duration_ms,
                    "summary_line": result.summary_line,
                    "metrics": result.metrics,
                    "suppressed": result.suppressed,
                    "suppressed_by": result.suppressed_by,
                }
            }),
            RenderEvent::RunEnd { run_id, result } => {
                let stats = result.stats();
                json!({
                    "v": 1,
                    "event_type": "run.end",
                    "ts": ts,
                    "run_id": run_id,
                    "metadata": {
                        "ok": result.ok,
                        "duration_ms": result.duration_ms,
                        "total": stats.total,
                        "passed": stats.passed,
                        "failed": stats.failed,
                        "suppressed": stats.suppressed,
                    }
                })
            }
        }
    }

    fn log_to_json(&self, result: &TaskResult) -> Value {
        json!({
            "v": 1,
            "event_type": "task.log",
            "ts": Local::now().to_rfc3339(),
            "path": result.path,
            "code": result.code,
            "output": result.output,
        })
    }

    fn summary_to_json(&self, result: &RunResult) -> Value {
        let results = serde_json::to_value(&result.results).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to serialize run results");
            Value::Null
        });
        json!({
            "v": 1,
            "event_type": "run.summary",
            "ts": Local::now().to_rfc3339(),
            "run_id": result.run_id,
            "ok": result.ok,
            "started_at": result.started_at.to_rfc3339(),
            "finished_at": result.finished_at.to_rfc3339(),
            "duration_ms": result.duration_ms,
            "results": results,
        })
    }

    fn emit(&self, value: &Value) {
        let line = if self.pretty_print {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        match line {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!(error = %err, "failed to encode event"),
        }
    }
}

impl ReporterPlugin for JsonlReporter {
    fn name(&self) -> &str {
        "jsonl-reporter"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        self.emit(&self.event_to_json(event));
    }

    fn output_logs(&self, results: &[TaskResult], verbosity: LogVerbosity) {
        for result in results.iter().filter(|r| verbosity.includes(r)) {
            self.emit(&self.log_to_json(result));
        }
    }

    fn output_summary(&self, result: &RunResult) {
        self.emit(&self.summary_to_json(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use veritree_core::tree::{RunSpec, VerificationNode, VerificationTree};

    #[test]
    fn run_start_lists_every_path() {
        let reporter = JsonlReporter::new(false);
        let tree = VerificationTree::new(vec![VerificationNode::group(
            "lint",
            vec![VerificationNode::leaf("tsc", RunSpec::Shell("tsc".into()))],
        )]);
        let value = reporter.event_to_json(&RenderEvent::RunStart {
            run_id: "r1".into(),
            tree,
        });
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["run_id"], "r1");
        assert_eq!(value["metadata"]["strategy"], "parallel");
        assert_eq!(value["metadata"]["tasks"], json!(["lint", "lint:tsc"]));
    }

    #[test]
    fn task_end_carries_attribution() {
        let reporter = JsonlReporter::new(false);
        let mut result = TaskResult::no_op("build", "build");
        result.summary_line = "terminated: format failed".into();
        result.suppress("format");
        let value = reporter.event_to_json(&RenderEvent::TaskComplete {
            run_id: "r1".into(),
            result,
        });
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["path"], "build");
        assert_eq!(value["metadata"]["ok"], false);
        assert_eq!(value["metadata"]["suppressed"], true);
        assert_eq!(value["metadata"]["suppressed_by"], "format");
        assert_eq!(value["metadata"]["group"], false);
    }

    #[test]
    fn summary_embeds_result_tree() {
        let reporter = JsonlReporter::new(false);
        let run = RunResult {
            run_id: "r1".into(),
            ok: true,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            duration_ms: 3,
            results: vec![TaskResult::no_op("a", "a")],
        };
        let value = reporter.summary_to_json(&run);
        assert_eq!(value["event_type"], "run.summary");
        assert_eq!(value["ok"], true);
        assert_eq!(value["results"][0]["path"], "a");
    }
}
