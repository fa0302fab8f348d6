use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Concurrency discipline applied to a group's children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    Parallel,
    Sequential,
    #[serde(alias = "failfast", alias = "fail_fast")]
    FailFast,
}

impl Strategy {
    /// Whether children run one after another in declaration order.
    pub fn is_ordered(self) -> bool {
        matches!(self, Strategy::Sequential | Strategy::FailFast)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Parallel => "parallel",
            Strategy::Sequential => "sequential",
            Strategy::FailFast => "fail-fast",
        }
    }
}

/// How a leaf's command is written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunSpec {
    /// A command line handed to the platform shell.
    Shell(String),
    /// `[program, args...]`, executed directly.
    Argv(Vec<String>),
    /// Fully specified command.
    Detailed(CommandSpec),
}

/// A concrete command: program, arguments, working directory and environment overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub cmd: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory, relative to the run's working directory unless absolute.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl CommandSpec {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Human-readable command line, used as the parser's detection hint.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.cmd.clone()
        } else {
            format!("{} {}", self.cmd, self.args.join(" "))
        }
    }
}

impl RunSpec {
    /// Normalize every configured shape into a single [`CommandSpec`].
    ///
    /// Shell strings run through `sh -c` (or `cmd /C` on Windows). An empty
    /// argv yields `None`, which the scheduler treats as a no-op leaf.
    pub fn to_command(&self) -> Option<CommandSpec> {
        match self {
            RunSpec::Shell(line) => {
                if line.trim().is_empty() {
                    return None;
                }
                Some(shell_command(line))
            }
            RunSpec::Argv(argv) => {
                let (program, rest) = argv.split_first()?;
                Some(CommandSpec::new(program.clone()).args(rest.iter().cloned()))
            }
            RunSpec::Detailed(spec) => {
                if spec.cmd.trim().is_empty() {
                    None
                } else {
                    Some(spec.clone())
                }
            }
        }
    }

    /// The command text as a user wrote it; fed to parser auto-detection.
    pub fn hint(&self) -> String {
        match self {
            RunSpec::Shell(line) => line.clone(),
            RunSpec::Argv(argv) => argv.join(" "),
            RunSpec::Detailed(spec) => spec.display(),
        }
    }
}

#[cfg(unix)]
fn shell_command(line: &str) -> CommandSpec {
    CommandSpec::new("sh").args(["-c", line])
}

#[cfg(windows)]
fn shell_command(line: &str) -> CommandSpec {
    CommandSpec::new("cmd").args(["/C", line])
}

/// One entry in the verification tree: a leaf (runs a command) or a group (has children).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationNode {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<VerificationNode>>,

    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,

    #[serde(
        default,
        alias = "reportingDependsOn",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub reporting_depends_on: Vec<String>,

    #[serde(default, alias = "successLabel", skip_serializing_if = "Option::is_none")]
    pub success_label: Option<String>,

    #[serde(default, alias = "failureLabel", skip_serializing_if = "Option::is_none")]
    pub failure_label: Option<String>,
}

impl VerificationNode {
    /// A leaf that runs `run`.
    pub fn leaf(key: impl Into<String>, run: RunSpec) -> Self {
        Self {
            key: key.into(),
            run: Some(run),
            ..Default::default()
        }
    }

    /// A group with the given children, run in parallel unless overridden.
    pub fn group(key: impl Into<String>, children: Vec<VerificationNode>) -> Self {
        Self {
            key: key.into(),
            children: Some(children),
            ..Default::default()
        }
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    pub fn depends_on<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reporting_depends_on = identifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn labels(mut self, success: Option<&str>, failure: Option<&str>) -> Self {
        self.success_label = success.map(str::to_string);
        self.failure_label = failure.map(str::to_string);
        self
    }

    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> &[VerificationNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// The root of a run: top-level nodes plus the strategy they are executed under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationTree {
    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default)]
    pub tasks: Vec<VerificationNode>,
}

impl VerificationTree {
    pub fn new(tasks: Vec<VerificationNode>) -> Self {
        Self {
            strategy: Strategy::Parallel,
            tasks,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Visit every node depth-first together with its path.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &VerificationNode),
    {
        fn go<F>(nodes: &[VerificationNode], parent: Option<&str>, visit: &mut F)
        where
            F: FnMut(&str, &VerificationNode),
        {
            for node in nodes {
                let path = super::path::join_path(parent, &node.key);
                visit(&path, node);
                go(node.children(), Some(&path), visit);
            }
        }
        go(&self.tasks, None, &mut visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_spec_accepts_all_shapes() {
        #[derive(Deserialize)]
        struct Wrapper {
            tasks: Vec<VerificationNode>,
        }

        let input = r#"
            [[tasks]]
            key = "fmt"
            run = "cargo fmt --check"

            [[tasks]]
            key = "build"
            run = ["cargo", "build", "--workspace"]
            reportingDependsOn = ["fmt"]

            [[tasks]]
            key = "test"
            run = { cmd = "cargo", args = ["test"], cwd = "crates/a", env = { RUST_LOG = "off" } }
        "#;
        let parsed: Wrapper = toml::from_str(input).unwrap();
        assert_eq!(parsed.tasks.len(), 3);
        assert!(matches!(parsed.tasks[0].run, Some(RunSpec::Shell(_))));
        assert_eq!(parsed.tasks[1].reporting_depends_on, vec!["fmt"]);

        let argv = parsed.tasks[1].run.as_ref().unwrap().to_command().unwrap();
        assert_eq!(argv.cmd, "cargo");
        assert_eq!(argv.args, vec!["build", "--workspace"]);

        let detailed = parsed.tasks[2].run.as_ref().unwrap().to_command().unwrap();
        assert_eq!(detailed.cwd, Some(PathBuf::from("crates/a")));
        assert_eq!(detailed.env.get("RUST_LOG").map(String::as_str), Some("off"));
    }

    #[test]
    fn strategy_parses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: Strategy,
        }
        let parsed: Wrapper = toml::from_str(r#"strategy = "fail-fast""#).unwrap();
        assert_eq!(parsed.strategy, Strategy::FailFast);
        assert!(parsed.strategy.is_ordered());
        assert!(!Strategy::Parallel.is_ordered());
    }

    #[test]
    fn empty_argv_is_a_no_op() {
        assert!(RunSpec::Argv(vec![]).to_command().is_none());
        assert!(RunSpec::Shell("   ".into()).to_command().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn shell_strings_go_through_sh() {
        let cmd = RunSpec::Shell("echo hi && exit 3".into()).to_command().unwrap();
        assert_eq!(cmd.cmd, "sh");
        assert_eq!(cmd.args, vec!["-c", "echo hi && exit 3"]);
    }

    #[test]
    fn walk_visits_paths_depth_first() {
        let tree = VerificationTree::new(vec![
            VerificationNode::group(
                "lint",
                vec![
                    VerificationNode::leaf("eslint", RunSpec::Shell("true".into())),
                    VerificationNode::leaf("tsc", RunSpec::Shell("true".into())),
                ],
            ),
            VerificationNode::leaf("test", RunSpec::Shell("true".into())),
        ]);
        let mut seen = Vec::new();
        tree.walk(|path, _| seen.push(path.to_string()));
        assert_eq!(seen, vec!["lint", "lint:eslint", "lint:tsc", "test"]);
    }
}
