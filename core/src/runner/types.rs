use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::tree::CommandSpec;

/// Default per-task capture cap: 4 MiB.
pub const DEFAULT_CAPTURE_BYTES: usize = 4 * 1024 * 1024;

/// Environment applied on top of the overlay so tools emit plain text.
pub const COLOR_DISABLED_ENV: [(&str, &str); 3] =
    [("NO_COLOR", "1"), ("FORCE_COLOR", "0"), ("CLICOLOR", "0")];

/// Everything needed to launch one leaf's command.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Task path, used for process registration.
    pub path: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: HashMap<String, String>,
    pub capture_bytes: usize,
}

impl CommandRequest {
    /// Resolve a configured command against the run's working directory.
    pub fn from_spec(path: &str, spec: &CommandSpec, base_cwd: &Path, capture_bytes: usize) -> Self {
        let cwd = match &spec.cwd {
            Some(dir) => base_cwd.join(dir),
            None => base_cwd.to_path_buf(),
        };
        Self {
            path: path.to_string(),
            program: spec.cmd.clone(),
            args: spec.args.clone(),
            cwd,
            envs: spec.env.clone(),
            capture_bytes,
        }
    }

    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// How one command ended.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CommandOutcome {
    pub exit_code: i32,
    /// Interleaved stdout and stderr.
    pub output: String,
    pub duration_ms: u64,
    /// The process was stopped by a cancellation signal rather than exiting on its own.
    pub was_terminated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_cwd_is_joined_to_base() {
        let spec = CommandSpec::new("make").args(["check"]).cwd("pkg/a");
        let req = CommandRequest::from_spec("build", &spec, Path::new("/work"), 10);
        assert_eq!(req.cwd, PathBuf::from("/work/pkg/a"));
        assert_eq!(req.display(), "make check");
    }

    #[cfg(unix)]
    #[test]
    fn absolute_cwd_replaces_base() {
        let spec = CommandSpec::new("true").cwd("/tmp");
        let req = CommandRequest::from_spec("t", &spec, Path::new("/work"), 10);
        assert_eq!(req.cwd, PathBuf::from("/tmp"));
    }
}
