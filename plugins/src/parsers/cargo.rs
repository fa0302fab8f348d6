use lazy_static::lazy_static;
use regex::Regex;
use veritree_core::executor::traits::ParsedOutput;
use veritree_core::executor::TaskMetrics;

use super::{duration_ms, plural, ToolParser};

lazy_static! {
    // test result: ok. 12 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out; finished in 0.01s
    static ref TEST_RESULT_RE: Regex = Regex::new(
        r"test result: \w+\. (\d+) passed; (\d+) failed; (\d+) ignored;.*?finished in ([\d.]+)s"
    )
    .unwrap();
    static ref ERROR_RE: Regex = Regex::new(r"(?m)^error(\[E\d+\])?: (.*)$").unwrap();
    static ref WARNING_RE: Regex = Regex::new(r"(?m)^warning: (.*)$").unwrap();
}

/// cargo test / build / check / clippy.
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoParser;

impl CargoParser {
    fn tests(output: &str) -> Option<ParsedOutput> {
        let mut seen = false;
        let (mut passed, mut failed, mut ignored, mut duration) = (0u64, 0u64, 0u64, 0u64);
        for caps in TEST_RESULT_RE.captures_iter(output) {
            seen = true;
            passed += caps[1].parse::<u64>().unwrap_or(0);
            failed += caps[2].parse::<u64>().unwrap_or(0);
            ignored += caps[3].parse::<u64>().unwrap_or(0);
            duration += duration_ms(&caps[4], "s").unwrap_or(0);
        }
        if !seen {
            return None;
        }

        let mut summary = format!("{passed} passed, {failed} failed");
        if ignored > 0 {
            summary.push_str(&format!(", {ignored} ignored"));
        }
        Some(ParsedOutput::summary(summary).with_metrics(TaskMetrics {
            passed: Some(passed),
            failed: Some(failed),
            total: Some(passed + failed + ignored),
            duration: Some(duration),
            ..Default::default()
        }))
    }

    fn diagnostics(output: &str, exit_code: i32) -> Option<ParsedOutput> {
        let errors = ERROR_RE
            .captures_iter(output)
            .filter(|caps| {
                let msg = &caps[2];
                !msg.starts_with("could not compile") && !msg.starts_with("aborting due to")
            })
            .count() as u64;
        let warnings = WARNING_RE
            .captures_iter(output)
            .filter(|caps| {
                let msg = &caps[1];
                !msg.contains("generated") || !msg.contains("warning")
            })
            .count() as u64;

        let summary = match (errors, warnings) {
            (0, 0) if exit_code == 0 => "ok".to_string(),
            (0, 0) => return None,
            (0, w) => plural(w, "warning"),
            (e, w) => format!("{}, {}", plural(e, "error"), plural(w, "warning")),
        };
        Some(ParsedOutput::summary(summary).with_metrics(TaskMetrics {
            errors: Some(errors),
            warnings: Some(warnings),
            ..Default::default()
        }))
    }
}

impl ToolParser for CargoParser {
    fn id(&self) -> &'static str {
        "cargo"
    }

    fn detect(&self, command_hint: &str) -> bool {
        command_hint
            .split_whitespace()
            .next()
            .map(|program| program.rsplit('/').next() == Some("cargo"))
            .unwrap_or(false)
    }

    fn parse(&self, output: &str, exit_code: i32) -> Option<ParsedOutput> {
        Self::tests(output).or_else(|| Self::diagnostics(output, exit_code))
    }
}
