use super::process::ProcessHandle;

/// Registry of live processes that may be cancelled by someone else.
///
/// The command executor registers a process immediately after spawn and
/// unregisters it once it has been reaped. The registry owns the decision
/// to terminate.
pub trait ProcessRegistry: Send + Sync {
    fn register_process(&self, path: &str, handle: ProcessHandle);
    fn unregister_process(&self, path: &str);
    /// True if a termination signal was delivered to the process registered under `path`.
    fn was_killed(&self, path: &str) -> bool;
}

/// Registry for commands run outside a tracked tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedRegistry;

impl ProcessRegistry for DetachedRegistry {
    fn register_process(&self, _path: &str, _handle: ProcessHandle) {}
    fn unregister_process(&self, _path: &str) {}
    fn was_killed(&self, _path: &str) -> bool {
        false
    }
}
