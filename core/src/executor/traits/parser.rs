use crate::executor::types::TaskMetrics;

/// What an output parser extracted from a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    /// One-line human summary
    pub summary: String,
    pub metrics: Option<TaskMetrics>,
}

impl ParsedOutput {
    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: TaskMetrics) -> Self {
        self.metrics = (!metrics.is_empty()).then_some(metrics);
        self
    }
}

/// Output parser plugin. Implementations are pure: no I/O, no shared state.
pub trait OutputParserPlugin: Send + Sync {
    fn parse(
        &self,
        output: &str,
        exit_code: i32,
        parser_id: Option<&str>,
        command_hint: Option<&str>,
    ) -> ParsedOutput;
}

/// Fallback parser keyed on the exit code alone. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitCodeParser;

impl OutputParserPlugin for ExitCodeParser {
    fn parse(
        &self,
        _output: &str,
        exit_code: i32,
        _parser_id: Option<&str>,
        _command_hint: Option<&str>,
    ) -> ParsedOutput {
        if exit_code == 0 {
            ParsedOutput::summary("passed")
        } else {
            ParsedOutput::summary(format!("failed (exit code {exit_code})"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_fallback() {
        let parser = ExitCodeParser;
        assert_eq!(parser.parse("", 0, None, None).summary, "passed");
        assert_eq!(
            parser.parse("boom", 2, Some("tsc"), None).summary,
            "failed (exit code 2)"
        );
    }

    #[test]
    fn empty_metrics_are_dropped() {
        let parsed = ParsedOutput::summary("x").with_metrics(TaskMetrics::default());
        assert!(parsed.metrics.is_none());
    }
}
