use veritree_core::executor::traits::{ExitCodeParser, OutputParserPlugin, ParsedOutput};

use super::ToolParser;

/// Exit-code-only parser; always produces a result.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericParser;

impl GenericParser {
    pub fn summarize(exit_code: i32) -> ParsedOutput {
        ExitCodeParser.parse("", exit_code, None, None)
    }
}

impl ToolParser for GenericParser {
    fn id(&self) -> &'static str {
        "generic"
    }

    fn detect(&self, _command_hint: &str) -> bool {
        false
    }

    fn parse(&self, _output: &str, exit_code: i32) -> Option<ParsedOutput> {
        Some(Self::summarize(exit_code))
    }
}
