//! Output parsers: turn a tool's raw output into a one-line summary and metrics.

pub mod cargo;
pub mod eslint;
pub mod generic;
pub mod tsc;
pub mod vitest;

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use veritree_core::executor::traits::{OutputParserPlugin, ParsedOutput};

pub use cargo::CargoParser;
pub use eslint::EslintParser;
pub use generic::GenericParser;
pub use tsc::TscParser;
pub use vitest::VitestParser;

/// One tool-specific parser.
pub trait ToolParser: Send + Sync {
    /// Identifier used by a task's `parser` field.
    fn id(&self) -> &'static str;

    /// Whether this parser recognises the command line.
    fn detect(&self, command_hint: &str) -> bool;

    /// `None` when the output does not look like this tool's.
    fn parse(&self, output: &str, exit_code: i32) -> Option<ParsedOutput>;
}

/// Picks a parser by explicit id, else by command detection, else falls back
/// to the exit-code parser.
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn ToolParser>>,
    fallback: GenericParser,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Registry with every built-in parser.
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Arc::new(TscParser),
                Arc::new(EslintParser),
                Arc::new(VitestParser),
                Arc::new(CargoParser),
            ],
            fallback: GenericParser,
        }
    }

    fn select(&self, parser_id: Option<&str>, command_hint: Option<&str>) -> Option<&dyn ToolParser> {
        if let Some(id) = parser_id {
            if id.eq_ignore_ascii_case(self.fallback.id()) {
                return None;
            }
            let found = self
                .parsers
                .iter()
                .find(|p| p.id().eq_ignore_ascii_case(id))
                .map(|p| p.as_ref());
            if found.is_none() {
                tracing::warn!(parser = id, "unknown parser; falling back to exit code");
            }
            return found;
        }
        let hint = command_hint?;
        self.parsers
            .iter()
            .find(|p| p.detect(hint))
            .map(|p| p.as_ref())
    }
}

impl OutputParserPlugin for ParserRegistry {
    fn parse(
        &self,
        output: &str,
        exit_code: i32,
        parser_id: Option<&str>,
        command_hint: Option<&str>,
    ) -> ParsedOutput {
        let clean = strip_ansi(output);
        self.select(parser_id, command_hint)
            .and_then(|p| p.parse(&clean, exit_code))
            .or_else(|| self.fallback.parse(&clean, exit_code))
            .unwrap_or_else(|| GenericParser::summarize(exit_code))
    }
}

lazy_static! {
    static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap();
    static ref WORD_RE: Regex = Regex::new(r"[A-Za-z0-9_.\-/]+").unwrap();
}

/// Remove terminal escape sequences some tools emit despite `NO_COLOR`.
pub fn strip_ansi(s: &str) -> String {
    ANSI_RE.replace_all(s, "").into_owned()
}

/// True if any whitespace-separated program token in `hint` is `tool`
/// (ignoring leading directories and `npx`-style prefixes).
pub(crate) fn mentions_tool(hint: &str, tool: &str) -> bool {
    WORD_RE
        .find_iter(hint)
        .map(|m| m.as_str().rsplit('/').next().unwrap_or(""))
        .any(|word| word == tool)
}

/// `1.25`, `s` -> 1250
pub(crate) fn duration_ms(value: &str, unit: &str) -> Option<u64> {
    let value: f64 = value.parse().ok()?;
    let ms = match unit {
        "ms" => value,
        "s" => value * 1_000.0,
        "m" => value * 60_000.0,
        _ => return None,
    };
    Some(ms.round() as u64)
}

pub(crate) fn plural(n: u64, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_id_wins_over_detection() {
        let registry = ParserRegistry::new();
        let out = "src/a.ts(1,1): error TS2304: Cannot find name 'x'.\n";
        let parsed = registry.parse(out, 2, Some("tsc"), Some("cargo test"));
        assert_eq!(parsed.summary, "1 type error");
    }

    #[test]
    fn detection_from_command_hint() {
        let registry = ParserRegistry::new();
        let out = "\n✖ 3 problems (1 error, 2 warnings)\n";
        let parsed = registry.parse(out, 1, None, Some("npx eslint src"));
        assert_eq!(parsed.summary, "1 error, 2 warnings");
    }

    #[test]
    fn unknown_id_and_unknown_tool_fall_back() {
        let registry = ParserRegistry::new();
        assert_eq!(
            registry.parse("", 3, Some("nope"), None).summary,
            "failed (exit code 3)"
        );
        assert_eq!(registry.parse("", 0, None, Some("make check")).summary, "passed");
    }

    #[test]
    fn unrecognised_output_falls_back() {
        let registry = ParserRegistry::new();
        let parsed = registry.parse("Segmentation fault", 139, Some("vitest"), None);
        assert_eq!(parsed.summary, "failed (exit code 139)");
    }

    #[test]
    fn strips_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[31merror\x1b[0m"), "error");
    }

    #[test]
    fn tool_mentions() {
        assert!(mentions_tool("npx vue-tsc --noEmit", "vue-tsc"));
        assert!(mentions_tool("./node_modules/.bin/tsc -p .", "tsc"));
        assert!(!mentions_tool("vue-tsc --noEmit", "tsc"));
        assert!(!mentions_tool("echo tscript", "tsc"));
    }

    #[test]
    fn durations() {
        assert_eq!(duration_ms("1.25", "s"), Some(1250));
        assert_eq!(duration_ms("850", "ms"), Some(850));
        assert_eq!(duration_ms("x", "s"), None);
    }
}
