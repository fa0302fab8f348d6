use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::process::Command;

use super::io_pump::pump;
use super::process::ProcessHandle;
use super::traits::ProcessRegistry;
use super::types::{CommandOutcome, CommandRequest, COLOR_DISABLED_ENV};
use crate::error::RunnerError;
use crate::util::RingBytes;

/// Exit code a shell reports for a child that died from SIGTERM.
pub const SIGTERM_EXIT_CODE: i32 = 143;

/// Run one command to completion or termination.
///
/// Never fails: a command that cannot be launched yields exit code 1 and a
/// diagnostic in place of its output.
pub async fn execute_command(req: &CommandRequest, registry: &dyn ProcessRegistry) -> CommandOutcome {
    let started = Instant::now();
    match run(req, registry, started).await {
        Ok(outcome) => outcome,
        Err(RunnerError::Spawn(e)) => {
            tracing::warn!(path = %req.path, command = %req.display(), error = %e, "failed to launch command");
            CommandOutcome {
                exit_code: 1,
                output: format!("Failed to execute command '{}': {}", req.display(), e),
                duration_ms: elapsed_ms(started),
                was_terminated: false,
            }
        }
        Err(e) => {
            tracing::warn!(path = %req.path, error = %e, "command did not complete cleanly");
            CommandOutcome {
                exit_code: 1,
                output: e.to_string(),
                duration_ms: elapsed_ms(started),
                was_terminated: registry.was_killed(&req.path),
            }
        }
    }
}

async fn run(
    req: &CommandRequest,
    registry: &dyn ProcessRegistry,
    started: Instant,
) -> Result<CommandOutcome, RunnerError> {
    let mut cmd = Command::new(&req.program);
    cmd.args(&req.args)
        .current_dir(&req.cwd)
        .envs(&req.envs)
        .envs(COLOR_DISABLED_ENV)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(RunnerError::Spawn)?;
    let pid = child.id();
    if let Some(pid) = pid {
        registry.register_process(&req.path, ProcessHandle::new(pid));
    }
    tracing::debug!(path = %req.path, pid = ?pid, command = %req.display(), "spawned");

    let ring = RingBytes::new(req.capture_bytes);
    let stdout = child.stdout.take().map(|s| pump(s, ring.clone(), "stdout"));
    let stderr = child.stderr.take().map(|s| pump(s, ring.clone(), "stderr"));

    let waited = child.wait().await;
    registry.unregister_process(&req.path);
    let status = waited.map_err(RunnerError::Wait)?;

    for handle in [stdout, stderr].into_iter().flatten() {
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!(path = %req.path, error = %e, "output pump failed"),
            Err(e) => tracing::debug!(path = %req.path, error = %e, "output pump panicked"),
        }
    }

    let killed = registry.was_killed(&req.path);
    let (exit_code, was_terminated) = classify(status, killed);
    let duration_ms = elapsed_ms(started);
    tracing::debug!(
        path = %req.path,
        exit_code,
        was_terminated,
        duration_ms,
        "command finished"
    );

    Ok(CommandOutcome {
        exit_code,
        output: ring.to_text(),
        duration_ms,
        was_terminated,
    })
}

/// Derive the exit code and whether the exit was caused by cancellation.
///
/// A process killed by someone else that nevertheless exited 0 finished on
/// its own before the signal landed, so it is not classified as terminated.
pub(crate) fn classify(status: ExitStatus, killed: bool) -> (i32, bool) {
    let signal = exit_signal(&status);
    let exit_code = match (status.code(), signal) {
        (Some(code), _) => code,
        (None, Some(sig)) => 128 + sig,
        (None, None) => 1,
    };
    let was_terminated = signal == Some(15)
        || exit_code == SIGTERM_EXIT_CODE
        || (killed && exit_code != 0);
    (exit_code, was_terminated)
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
