use lazy_static::lazy_static;
use regex::Regex;
use veritree_core::executor::traits::ParsedOutput;
use veritree_core::executor::TaskMetrics;

use super::{duration_ms, mentions_tool, ToolParser};

lazy_static! {
    // vitest:   Tests  1 failed | 12 passed (13)
    static ref VITEST_TESTS_RE: Regex = Regex::new(r"(?m)^\s*Tests\s+(.+?)\s*\((\d+)\)\s*$").unwrap();
    // jest:     Tests:       1 failed, 5 passed, 6 total
    static ref JEST_TESTS_RE: Regex = Regex::new(r"(?m)^\s*Tests:\s+(.+?)\s*$").unwrap();
    static ref COUNT_RE: Regex = Regex::new(r"(\d+) (failed|passed|skipped|todo|total)").unwrap();
    static ref DURATION_RE: Regex =
        Regex::new(r"(?m)^\s*(?:Duration|Time:)\s+([\d.]+)\s*(ms|s|m)\b").unwrap();
}

#[derive(Debug, Default)]
struct Counts {
    passed: u64,
    failed: u64,
    skipped: u64,
    total: Option<u64>,
}

fn count(list: &str) -> Counts {
    let mut counts = Counts::default();
    for caps in COUNT_RE.captures_iter(list) {
        let n: u64 = caps[1].parse().unwrap_or(0);
        match &caps[2] {
            "passed" => counts.passed += n,
            "failed" => counts.failed += n,
            "total" => counts.total = Some(n),
            _ => counts.skipped += n,
        }
    }
    counts
}

/// Vitest and Jest test runners.
#[derive(Debug, Default, Clone, Copy)]
pub struct VitestParser;

impl ToolParser for VitestParser {
    fn id(&self) -> &'static str {
        "vitest"
    }

    fn detect(&self, command_hint: &str) -> bool {
        mentions_tool(command_hint, "vitest") || mentions_tool(command_hint, "jest")
    }

    fn parse(&self, output: &str, _exit_code: i32) -> Option<ParsedOutput> {
        let counts = if let Some(caps) = VITEST_TESTS_RE.captures(output) {
            let mut counts = count(&caps[1]);
            counts.total = caps[2].parse().ok();
            counts
        } else {
            let caps = JEST_TESTS_RE.captures(output)?;
            count(&caps[1])
        };
        let total = counts
            .total
            .unwrap_or(counts.passed + counts.failed + counts.skipped);

        let mut summary = format!("{} passed", counts.passed);
        if counts.failed > 0 {
            summary.push_str(&format!(", {} failed", counts.failed));
        }
        if counts.skipped > 0 {
            summary.push_str(&format!(", {} skipped", counts.skipped));
        }
        summary.push_str(&format!(" ({total} total)"));

        let duration = DURATION_RE
            .captures(output)
            .and_then(|caps| duration_ms(&caps[1], &caps[2]));
        Some(ParsedOutput::summary(summary).with_metrics(TaskMetrics {
            passed: Some(counts.passed),
            failed: Some(counts.failed),
            total: Some(total),
            duration,
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitest_summary() {
        let out = "\
 ❯ src/math.test.ts (3 tests | 1 failed) 12ms

 Test Files  1 failed | 4 passed (5)
      Tests  1 failed | 12 passed | 2 skipped (15)
   Start at  10:00:00
   Duration  1.52s (transform 80ms, setup 0ms)
";
        let parsed = VitestParser.parse(out, 1).unwrap();
        assert_eq!(parsed.summary, "12 passed, 1 failed, 2 skipped (15 total)");
        let metrics = parsed.metrics.unwrap();
        assert_eq!(metrics.passed, Some(12));
        assert_eq!(metrics.failed, Some(1));
        assert_eq!(metrics.total, Some(15));
        assert_eq!(metrics.duration, Some(1520));
    }

    #[test]
    fn jest_summary() {
        let out = "\
Test Suites: 1 failed, 2 passed, 3 total
Tests:       1 failed, 5 passed, 6 total
Snapshots:   0 total
Time:        2.5 s
";
        let parsed = VitestParser.parse(out, 1).unwrap();
        assert_eq!(parsed.summary, "5 passed, 1 failed (6 total)");
        assert_eq!(parsed.metrics.unwrap().duration, Some(2500));
    }

    #[test]
    fn all_green() {
        let out = "      Tests  8 passed (8)\n   Duration  640ms\n";
        let parsed = VitestParser.parse(out, 0).unwrap();
        assert_eq!(parsed.summary, "8 passed (8 total)");
        assert_eq!(parsed.metrics.unwrap().duration, Some(640));
    }

    #[test]
    fn no_summary_is_not_ours() {
        assert!(VitestParser.parse("Error: Cannot find module 'vitest'", 1).is_none());
    }
}
