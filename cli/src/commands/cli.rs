use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use veritree_core::api::LogVerbosity;

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Jsonl,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Jsonl => "jsonl",
        }
    }
}

/// Run a tree of verification tasks with dependency-aware failure reporting.
#[derive(Parser, Debug)]
#[command(name = "veritree", version, args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: veritree.toml or .veritree.toml in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Working directory for discovery and for tasks without their own `cwd`
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Treat unresolved `reporting_depends_on` identifiers as errors
    #[arg(long, global = true)]
    pub strict_deps: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Which task logs to print after the run: all, failed or none
    #[arg(long)]
    pub logs: Option<LogVerbosity>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Cap on concurrently running task processes (0 = unlimited)
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// ASCII status markers instead of symbols
    #[arg(long)]
    pub ascii: bool,

    /// Task paths to run (`lint`, `lint:types:tsc`); everything when empty
    pub filters: Vec<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the configured tasks (the default)
    Run(RunArgs),
    /// Print every task path with its resolved dependencies
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_filters_run_by_default() {
        let args = Args::parse_from(["veritree", "--logs", "all", "lint", "test"]);
        assert!(args.command.is_none());
        assert_eq!(args.run.filters, vec!["lint", "test"]);
        assert_eq!(args.run.logs, Some(LogVerbosity::All));
        assert_eq!(args.run.format, ReportFormat::Text);
    }

    #[test]
    fn run_subcommand_with_global_flags() {
        let args = Args::parse_from([
            "veritree",
            "run",
            "--format",
            "jsonl",
            "--max-parallel",
            "2",
            "--strict-deps",
            "lint:tsc",
        ]);
        let Some(Commands::Run(run)) = args.command else {
            panic!("expected run subcommand");
        };
        assert!(args.strict_deps);
        assert_eq!(run.format, ReportFormat::Jsonl);
        assert_eq!(run.max_parallel, Some(2));
        assert_eq!(run.filters, vec!["lint:tsc"]);
    }

    #[test]
    fn list_subcommand() {
        let args = Args::parse_from(["veritree", "--config", "ci.toml", "list"]);
        assert!(matches!(args.command, Some(Commands::List)));
        assert_eq!(args.config, Some(PathBuf::from("ci.toml")));
    }

    #[test]
    fn rejects_unknown_verbosity() {
        assert!(Args::try_parse_from(["veritree", "--logs", "loud"]).is_err());
    }
}
