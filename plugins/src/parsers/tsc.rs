use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use veritree_core::executor::traits::ParsedOutput;
use veritree_core::executor::TaskMetrics;

use super::{mentions_tool, plural, ToolParser};

lazy_static! {
    // src/a.ts(3,5): error TS2322: ...   |   src/a.ts:3:5 - error TS2322: ...
    static ref DIAGNOSTIC_RE: Regex =
        Regex::new(r"(?m)^(.+?)(?:\(\d+,\d+\):|:\d+:\d+ -) error TS\d+:").unwrap();
    static ref BARE_ERROR_RE: Regex = Regex::new(r"(?m)^error TS\d+:").unwrap();
    static ref FOUND_RE: Regex = Regex::new(r"Found (\d+) errors?").unwrap();
}

/// TypeScript compiler (`tsc`, `vue-tsc`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TscParser;

impl ToolParser for TscParser {
    fn id(&self) -> &'static str {
        "tsc"
    }

    fn detect(&self, command_hint: &str) -> bool {
        mentions_tool(command_hint, "tsc") || mentions_tool(command_hint, "vue-tsc")
    }

    fn parse(&self, output: &str, exit_code: i32) -> Option<ParsedOutput> {
        let mut files = HashSet::new();
        let mut errors = 0u64;
        for caps in DIAGNOSTIC_RE.captures_iter(output) {
            errors += 1;
            files.insert(caps[1].trim().to_string());
        }
        errors += BARE_ERROR_RE.find_iter(output).count() as u64;

        if let Some(caps) = FOUND_RE.captures(output) {
            errors = errors.max(caps[1].parse().unwrap_or(0));
        }

        if errors == 0 {
            if exit_code != 0 {
                return None;
            }
            return Some(
                ParsedOutput::summary("no type errors").with_metrics(TaskMetrics {
                    errors: Some(0),
                    ..Default::default()
                }),
            );
        }

        let mut summary = plural(errors, "type error");
        if files.len() > 1 {
            summary.push_str(&format!(" in {} files", files.len()));
        }
        Some(ParsedOutput::summary(summary).with_metrics(TaskMetrics {
            errors: Some(errors),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_both_diagnostic_styles() {
        let out = "\
src/a.ts(3,5): error TS2322: Type 'string' is not assignable to type 'number'.
src/b.ts:10:1 - error TS2304: Cannot find name 'foo'.

Found 2 errors in 2 files.
";
        let parsed = TscParser.parse(out, 2).unwrap();
        assert_eq!(parsed.summary, "2 type errors in 2 files");
        assert_eq!(parsed.metrics.unwrap().errors, Some(2));
    }

    #[test]
    fn clean_run() {
        let parsed = TscParser.parse("", 0).unwrap();
        assert_eq!(parsed.summary, "no type errors");
    }

    #[test]
    fn failure_without_diagnostics_is_not_ours() {
        assert!(TscParser.parse("tsc: command not found", 127).is_none());
    }

    #[test]
    fn config_errors_count() {
        let parsed = TscParser
            .parse("error TS5058: The specified path does not exist: 'nope'.\n", 1)
            .unwrap();
        assert_eq!(parsed.summary, "1 type error");
    }
}
