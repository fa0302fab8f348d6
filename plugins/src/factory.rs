use std::sync::Arc;

use anyhow::{bail, Result};

use veritree_core::executor::traits::{OutputParserPlugin, ReporterPlugin};

use crate::parsers::ParserRegistry;
use crate::renderers::{JsonlReporter, TextReporter};

pub const REPORT_FORMATS: &[&str] = &["text", "jsonl"];

pub fn build_reporter(format: &str, ascii_only: bool) -> Result<Arc<dyn ReporterPlugin>> {
    match format.trim().to_ascii_lowercase().as_str() {
        "text" => Ok(Arc::new(TextReporter::new(ascii_only))),
        "jsonl" => Ok(Arc::new(JsonlReporter::new(false))),
        other => bail!(
            "unknown report format '{other}' (expected one of: {})",
            REPORT_FORMATS.join(", ")
        ),
    }
}

pub fn build_parser() -> Arc<dyn OutputParserPlugin> {
    Arc::new(ParserRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_known_formats() {
        assert_eq!(build_reporter("text", false).unwrap().format(), "text");
        assert_eq!(build_reporter("JSONL", false).unwrap().format(), "jsonl");
        assert!(build_reporter("xml", false).is_err());
    }

    #[test]
    fn parser_falls_back_to_exit_code() {
        let parser = build_parser();
        assert_eq!(parser.parse("", 0, None, None).summary, "passed");
    }
}
