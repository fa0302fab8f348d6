/// A spawned child process. On Unix the child leads its own process group,
/// so terminating it reaches everything the command started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: u32,
}

/// Result of a termination attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateOutcome {
    Delivered,
    /// The process had already exited.
    AlreadyExited,
    Failed(String),
}

impl ProcessHandle {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send SIGTERM to the whole process group.
    #[cfg(unix)]
    pub fn terminate_tree(&self) -> TerminateOutcome {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(self.pid) else {
            return TerminateOutcome::Failed(format!("pid {} out of range", self.pid));
        };
        match killpg(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) => TerminateOutcome::Delivered,
            Err(Errno::ESRCH) => TerminateOutcome::AlreadyExited,
            Err(e) => TerminateOutcome::Failed(e.to_string()),
        }
    }

    /// Kill the process and its descendants with `taskkill /T /F`.
    #[cfg(windows)]
    pub fn terminate_tree(&self) -> TerminateOutcome {
        let status = std::process::Command::new("taskkill")
            .args(["/PID", &self.pid.to_string(), "/T", "/F"])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => TerminateOutcome::Delivered,
            // 128: no such process
            Ok(s) if s.code() == Some(128) => TerminateOutcome::AlreadyExited,
            Ok(s) => TerminateOutcome::Failed(format!("taskkill exited with {s}")),
            Err(e) => TerminateOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn terminating_an_exited_group_reports_already_exited() {
        let mut child = tokio::process::Command::new("true")
            .process_group(0)
            .spawn()
            .unwrap();
        let handle = ProcessHandle::new(child.id().unwrap());
        child.wait().await.unwrap();
        assert_eq!(handle.terminate_tree(), TerminateOutcome::AlreadyExited);
    }

    #[tokio::test]
    async fn terminate_reaches_the_group() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = tokio::process::Command::new("sh")
            .args(["-c", "sleep 5"])
            .process_group(0)
            .spawn()
            .unwrap();
        let handle = ProcessHandle::new(child.id().unwrap());
        assert_eq!(handle.terminate_tree(), TerminateOutcome::Delivered);
        let status = child.wait().await.unwrap();
        assert_eq!(status.signal(), Some(15));
    }
}
