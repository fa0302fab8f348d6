use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;

use super::graph::DependencyGraph;
use super::types::TaskResult;
use crate::error::ExecutorError;
use crate::runner::{ProcessHandle, ProcessRegistry, TerminateOutcome};
use crate::tree::path::{is_same_or_descendant, parent_path};
use crate::tree::VerificationTree;

/// Per-run coordination point for reporting dependencies.
///
/// Owns the resolved graph, the results recorded so far, the waiters parked on
/// results that have not arrived yet and the live processes that may be
/// cancelled. One instance per run.
#[derive(Debug)]
pub struct DependencyTracker {
    graph: DependencyGraph,
    state: Mutex<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    results: HashMap<String, TaskResult>,
    /// Paths that will never produce a result in this run (filtered out or skipped).
    settled: HashSet<String>,
    waiters: HashMap<String, Vec<oneshot::Sender<()>>>,
    processes: HashMap<String, ProcessHandle>,
    /// Killed path -> failed dependency that caused it.
    killed: HashMap<String, String>,
}

impl TrackerState {
    fn is_resolved(&self, path: &str) -> bool {
        self.results.contains_key(path) || self.settled.contains(path)
    }

    fn failed(&self, path: &str) -> bool {
        self.results.get(path).is_some_and(|r| !r.ok)
    }
}

impl DependencyTracker {
    /// Walk the whole tree, resolve every declared dependency and reject cycles.
    pub fn initialize(tree: &VerificationTree, strict: bool) -> Result<Self, ExecutorError> {
        let graph = DependencyGraph::build(tree, strict)?;
        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "reporting dependency graph ready"
        );
        Ok(Self {
            graph,
            state: Mutex::new(TrackerState::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn has_dependencies(&self, path: &str) -> bool {
        !self.graph.dependencies(path).is_empty()
    }

    /// Resolve once every dependency of `path` has a result (or never will).
    pub async fn wait_for_dependencies(&self, path: &str) {
        let receivers = {
            let mut state = self.lock();
            let mut receivers = Vec::new();
            for dep in self.graph.dependencies(path) {
                if state.is_resolved(dep) {
                    continue;
                }
                let (tx, rx) = oneshot::channel();
                state.waiters.entry(dep.clone()).or_default().push(tx);
                receivers.push(rx);
            }
            receivers
        };

        if receivers.is_empty() {
            return;
        }
        tracing::debug!(path, pending = receivers.len(), "waiting for dependencies");
        for rx in receivers {
            // A dropped sender means the tracker went away; nothing left to wait for.
            let _ = rx.await;
        }
    }

    /// Store `result`. The first write for a path wins.
    ///
    /// A failed result cancels running dependents before any waiter resumes.
    /// Returns false if a result was already recorded for the path.
    pub fn record_result(&self, result: &TaskResult) -> bool {
        let waiters = {
            let mut state = self.lock();
            if state.results.contains_key(&result.path) {
                tracing::error!(path = %result.path, "result recorded twice; keeping the first");
                return false;
            }
            state.results.insert(result.path.clone(), result.clone());
            state.waiters.remove(&result.path).unwrap_or_default()
        };

        if !result.ok {
            self.kill_dependents(&result.path);
        }
        for tx in waiters {
            let _ = tx.send(());
        }
        true
    }

    /// Mark paths that will not run, releasing anyone waiting on them.
    pub fn settle<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut released = Vec::new();
        {
            let mut state = self.lock();
            for path in paths {
                let path = path.as_ref();
                if state.is_resolved(path) {
                    continue;
                }
                state.settled.insert(path.to_string());
                released.extend(state.waiters.remove(path).unwrap_or_default());
            }
        }
        for tx in released {
            let _ = tx.send(());
        }
    }

    /// Settle `path` and everything beneath it that has no result yet.
    pub fn skip_subtree(&self, path: &str) {
        let skipped: Vec<&String> = self
            .graph
            .paths()
            .iter()
            .filter(|p| is_same_or_descendant(p, path))
            .collect();
        tracing::debug!(path, count = skipped.len(), "skipping subtree");
        self.settle(skipped);
    }

    /// Settle every known path that is not going to be scheduled.
    pub fn settle_unscheduled(&self, scheduled: &HashSet<String>) {
        let unscheduled: Vec<&String> = self
            .graph
            .paths()
            .iter()
            .filter(|p| !scheduled.contains(p.as_str()))
            .collect();
        if !unscheduled.is_empty() {
            tracing::debug!(count = unscheduled.len(), "tasks excluded by filters");
        }
        self.settle(unscheduled);
    }

    /// The first dependency in scope of `path` that recorded a failure.
    ///
    /// The path's own dependencies are checked first, in declaration order,
    /// then those of each enclosing group from the innermost outwards.
    pub fn failed_dependency(&self, path: &str) -> Option<String> {
        let state = self.lock();
        self.failed_dependency_in_scope(&state, path)
    }

    /// Failed dependency that triggered termination of `path`, if it was killed.
    pub fn kill_cause(&self, path: &str) -> Option<String> {
        self.lock().killed.get(path).cloned()
    }

    pub fn result(&self, path: &str) -> Option<TaskResult> {
        self.lock().results.get(path).cloned()
    }

    /// Track a live process so it can be cancelled.
    ///
    /// If a dependency of the path (or of an enclosing group) has already
    /// failed, the process is terminated straight away.
    pub fn register_process(&self, path: &str, handle: ProcessHandle) {
        let cause = {
            let mut state = self.lock();
            state.processes.insert(path.to_string(), handle);
            self.failed_dependency_in_scope(&state, path)
        };
        if let Some(cause) = cause {
            tracing::debug!(path, cause = %cause, "dependency failed before launch finished");
            self.terminate(vec![(path.to_string(), handle)], &cause);
        }
    }

    pub fn unregister_process(&self, path: &str) {
        self.lock().processes.remove(path);
    }

    pub fn was_killed(&self, path: &str) -> bool {
        self.lock().killed.contains_key(path)
    }

    /// Terminate every running process whose task depends on `failed_path`,
    /// including processes running beneath a dependent group.
    ///
    /// Safe to call repeatedly: processes already killed or already exited are
    /// left alone.
    pub fn kill_dependents(&self, failed_path: &str) {
        let dependents = self.graph.dependents(failed_path);
        if dependents.is_empty() {
            return;
        }
        let targets: Vec<(String, ProcessHandle)> = {
            let state = self.lock();
            state
                .processes
                .iter()
                .filter(|(path, _)| !state.killed.contains_key(path.as_str()))
                .filter(|(path, _)| dependents.iter().any(|d| is_same_or_descendant(path, d)))
                .map(|(path, handle)| (path.clone(), *handle))
                .collect()
        };
        self.terminate(targets, failed_path);
    }

    fn terminate(&self, targets: Vec<(String, ProcessHandle)>, cause: &str) {
        for (path, handle) in targets {
            match handle.terminate_tree() {
                TerminateOutcome::Delivered => {
                    tracing::info!(path = %path, pid = handle.pid(), cause, "terminated dependent task");
                    self.lock()
                        .killed
                        .entry(path)
                        .or_insert_with(|| cause.to_string());
                }
                TerminateOutcome::AlreadyExited => {
                    tracing::debug!(path = %path, pid = handle.pid(), "dependent already exited");
                }
                TerminateOutcome::Failed(e) => {
                    tracing::warn!(path = %path, pid = handle.pid(), error = %e, "failed to terminate dependent task");
                }
            }
        }
    }

    fn failed_dependency_in_scope(&self, state: &TrackerState, path: &str) -> Option<String> {
        let mut scope = Some(path);
        while let Some(current) = scope {
            if let Some(dep) = self
                .graph
                .dependencies(current)
                .iter()
                .find(|dep| state.failed(dep))
            {
                return Some(dep.clone());
            }
            scope = parent_path(current);
        }
        None
    }
}

impl ProcessRegistry for DependencyTracker {
    fn register_process(&self, path: &str, handle: ProcessHandle) {
        DependencyTracker::register_process(self, path, handle);
    }

    fn unregister_process(&self, path: &str) {
        DependencyTracker::unregister_process(self, path);
    }

    fn was_killed(&self, path: &str) -> bool {
        DependencyTracker::was_killed(self, path)
    }
}
