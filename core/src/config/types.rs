use serde::{Deserialize, Serialize};

use crate::executor::traits::LogVerbosity;
use crate::executor::ExecutionOpts;
use crate::runner::DEFAULT_CAPTURE_BYTES;
use crate::tree::{Strategy, VerificationNode, VerificationTree};

/// Contents of `veritree.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Strategy applied to the top-level tasks
    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub tasks: Vec<VerificationNode>,
}

impl AppConfig {
    pub fn tree(&self) -> VerificationTree {
        VerificationTree {
            strategy: self.strategy,
            tasks: self.tasks.clone(),
        }
    }

    /// Engine options derived from the `[run]` table.
    pub fn execution_opts(&self) -> ExecutionOpts {
        ExecutionOpts::default()
            .with_max_parallel(self.run.max_parallel)
            .with_capture_bytes(self.run.capture_bytes)
            .with_strict_dependencies(self.run.strict_dependencies)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or the OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "veritree_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Which task logs are printed after the run
    #[serde(default)]
    pub logs: LogVerbosity,

    /// Cap on concurrently running leaf processes
    #[serde(default, alias = "maxParallel")]
    pub max_parallel: Option<usize>,

    /// Per-task output capture, tail kept
    #[serde(default = "default_capture_bytes", alias = "captureBytes")]
    pub capture_bytes: usize,

    /// Reject dependency identifiers that do not resolve
    #[serde(default, alias = "strictDependencies")]
    pub strict_dependencies: bool,
}

fn default_capture_bytes() -> usize {
    DEFAULT_CAPTURE_BYTES
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            logs: LogVerbosity::default(),
            max_parallel: None,
            capture_bytes: default_capture_bytes(),
            strict_dependencies: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg: AppConfig = toml::from_str(
            r#"
            strategy = "fail-fast"

            [logging]
            level = "debug"

            [run]
            logs = "all"
            maxParallel = 4
            strict_dependencies = true

            [[tasks]]
            key = "format"
            run = "cargo fmt --check"

            [[tasks]]
            key = "checks"
            strategy = "sequential"

            [[tasks.children]]
            key = "clippy"
            run = ["cargo", "clippy"]
            reporting_depends_on = ["format"]
            failure_label = "{key}: {summary}"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.strategy, Strategy::FailFast);
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.console);
        assert!(!cfg.logging.file);
        assert_eq!(cfg.run.logs, LogVerbosity::All);
        assert_eq!(cfg.run.max_parallel, Some(4));
        assert_eq!(cfg.run.capture_bytes, DEFAULT_CAPTURE_BYTES);

        let tree = cfg.tree();
        assert_eq!(tree.tasks.len(), 2);
        let clippy = &tree.tasks[1].children()[0];
        assert_eq!(clippy.reporting_depends_on, vec!["format"]);
        assert_eq!(tree.tasks[1].strategy, Strategy::Sequential);

        let opts = cfg.execution_opts();
        assert_eq!(opts.max_parallel, Some(4));
        assert!(opts.strict_dependencies);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert!(cfg.tasks.is_empty());
        assert_eq!(cfg.run, RunConfig::default());
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn unknown_task_fields_are_rejected() {
        let err = toml::from_str::<AppConfig>(
            r#"
            [[tasks]]
            key = "a"
            comand = "typo"
            "#,
        );
        assert!(err.is_err());
    }
}
