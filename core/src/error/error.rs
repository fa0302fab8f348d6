use thiserror::Error;

use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code for an error that aborted the run.
    ///
    /// 1 is reserved for a run that completed with failures.
    pub fn exit_code(&self) -> i32 {
        // 11: config error
        // 20: IO error
        // 50: internal/uncategorized
        match self {
            CliError::Config(_) => 11,
            CliError::Executor(_) => 11,
            CliError::Io(_) => 20,
            CliError::Anyhow(_) => 50,
        }
    }
}

/// Failures inside the command executor. These never escape a task: the
/// scheduler folds them into that task's result.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("wait failed: {0}")]
    Wait(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(CliError::Config("bad".into()).exit_code(), 11);
        let cycle = ExecutorError::CircularDependency {
            cycle: vec!["a".into(), "a".into()],
        };
        assert_eq!(CliError::from(cycle).exit_code(), 11);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(CliError::from(io).exit_code(), 20);
        assert_eq!(CliError::from(anyhow::anyhow!("x")).exit_code(), 50);
    }
}
