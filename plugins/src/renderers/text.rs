use veritree_core::executor::label::format_duration;
use veritree_core::executor::traits::{LogVerbosity, RenderEvent, ReporterPlugin};
use veritree_core::executor::{RunResult, TaskResult};

/// Human-readable reporter.
///
/// Leaf results are printed as they complete; the full result tree is printed
/// once the run ends, followed by task logs and a one-line summary.
pub struct TextReporter {
    ascii_only: bool,
}

impl TextReporter {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn marker(&self, result: &TaskResult) -> &'static str {
        match (result.ok, result.suppressed, self.ascii_only) {
            (true, _, false) => "✓",
            (true, _, true) => "OK",
            (false, true, false) => "⊘",
            (false, true, true) => "SUPP",
            (false, false, false) => "✗",
            (false, false, true) => "FAIL",
        }
    }

    fn format_line(&self, result: &TaskResult, label: &str) -> String {
        format!(
            "{} {}  {} ({})",
            self.marker(result),
            label,
            result.summary_line,
            format_duration(result.duration_ms)
        )
    }

    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        match event {
            RenderEvent::RunStart { run_id, tree } => {
                let mut leaves = 0usize;
                tree.walk(|_, node| {
                    if !node.is_group() {
                        leaves += 1;
                    }
                });
                Some(format!(
                    "veritree run {} ({} tasks, {})",
                    short_id(run_id),
                    leaves,
                    tree.strategy.as_str()
                ))
            }
            // Completion lines only.
            RenderEvent::TaskStart { .. } => None,
            RenderEvent::TaskComplete { result, .. } if !result.is_group() => {
                Some(self.format_line(result, &result.path))
            }
            RenderEvent::TaskComplete { .. } => None,
            RenderEvent::RunEnd { result, .. } => {
                let mut out = String::new();
                for top in &result.results {
                    self.format_tree(top, 0, &mut out);
                }
                Some(out.trim_end().to_string())
            }
        }
    }

    fn format_tree(&self, result: &TaskResult, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.format_line(result, &result.key));
        out.push('\n');
        for child in result.children.iter().flatten() {
            self.format_tree(child, depth + 1, out);
        }
    }

    fn format_logs(&self, results: &[TaskResult], verbosity: LogVerbosity) -> Vec<String> {
        let rule = if self.ascii_only { "---" } else { "───" };
        results
            .iter()
            .filter(|r| verbosity.includes(r) && !r.output.trim().is_empty())
            .map(|r| {
                format!(
                    "{rule} {} (exit {}) {rule}\n{}",
                    r.path,
                    r.code,
                    r.output.trim_end()
                )
            })
            .collect()
    }

    fn format_summary(&self, result: &RunResult) -> String {
        let stats = result.stats();
        let duration = format_duration(result.duration_ms);
        if result.ok && stats.failed == 0 && stats.suppressed == 0 {
            return format!(
                "{} {} passed ({duration})",
                if self.ascii_only { "PASS" } else { "✓" },
                stats.total
            );
        }

        let mut parts = vec![format!("{} passed", stats.passed)];
        if stats.failed > 0 {
            parts.push(format!("{} failed", stats.failed));
        }
        if stats.suppressed > 0 {
            parts.push(format!("{} suppressed", stats.suppressed));
        }
        let marker = match (result.ok, self.ascii_only) {
            (true, false) => "✓",
            (true, true) => "PASS",
            (false, false) => "✗",
            (false, true) => "FAIL",
        };
        format!("{marker} {} of {} ({duration})", parts.join(", "), stats.total)
    }
}

fn short_id(run_id: &str) -> &str {
    run_id.get(..8).unwrap_or(run_id)
}

impl ReporterPlugin for TextReporter {
    fn name(&self) -> &str {
        "text-reporter"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(line) = self.format_event(event) {
            println!("{line}");
        }
    }

    fn output_logs(&self, results: &[TaskResult], verbosity: LogVerbosity) {
        for block in self.format_logs(results, verbosity) {
            println!("\n{block}");
        }
    }

    fn output_summary(&self, result: &RunResult) {
        println!("\n{}", self.format_summary(result));
    }
}
