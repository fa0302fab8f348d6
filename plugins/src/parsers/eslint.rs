use lazy_static::lazy_static;
use regex::Regex;
use veritree_core::executor::traits::ParsedOutput;
use veritree_core::executor::TaskMetrics;

use super::{mentions_tool, plural, ToolParser};

lazy_static! {
    // ✖ 5 problems (3 errors, 2 warnings)
    static ref PROBLEMS_RE: Regex =
        Regex::new(r"(\d+) problems? \((\d+) errors?, (\d+) warnings?\)").unwrap();
}

/// ESLint, default "stylish" formatter.
#[derive(Debug, Default, Clone, Copy)]
pub struct EslintParser;

impl ToolParser for EslintParser {
    fn id(&self) -> &'static str {
        "eslint"
    }

    fn detect(&self, command_hint: &str) -> bool {
        mentions_tool(command_hint, "eslint")
    }

    fn parse(&self, output: &str, exit_code: i32) -> Option<ParsedOutput> {
        let Some(caps) = PROBLEMS_RE.captures(output) else {
            if exit_code == 0 {
                return Some(ParsedOutput::summary("no lint problems").with_metrics(TaskMetrics {
                    errors: Some(0),
                    warnings: Some(0),
                    ..Default::default()
                }));
            }
            return None;
        };
        let errors: u64 = caps[2].parse().ok()?;
        let warnings: u64 = caps[3].parse().ok()?;
        let summary = format!("{}, {}", plural(errors, "error"), plural(warnings, "warning"));
        Some(ParsedOutput::summary(summary).with_metrics(TaskMetrics {
            errors: Some(errors),
            warnings: Some(warnings),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stylish_summary() {
        let out = "\
/repo/src/a.js
  1:7  error    'x' is assigned a value but never used  no-unused-vars
  2:1  warning  Unexpected console statement            no-console

✖ 2 problems (1 error, 1 warning)
";
        let parsed = EslintParser.parse(out, 1).unwrap();
        assert_eq!(parsed.summary, "1 error, 1 warning");
        let metrics = parsed.metrics.unwrap();
        assert_eq!(metrics.errors, Some(1));
        assert_eq!(metrics.warnings, Some(1));
    }

    #[test]
    fn silent_success() {
        assert_eq!(EslintParser.parse("", 0).unwrap().summary, "no lint problems");
    }

    #[test]
    fn crash_is_not_ours() {
        assert!(EslintParser.parse("Oops! Something went wrong!", 2).is_none());
    }
}
