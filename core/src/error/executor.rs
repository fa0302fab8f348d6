use thiserror::Error;

/// Errors raised while preparing a verification tree for execution.
///
/// Every variant is a configuration problem: it is detected before any
/// process is spawned and aborts the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Circular reporting dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Invalid task '{path}': {reason}")]
    InvalidNode { path: String, reason: String },

    #[error("Duplicate key '{key}' under '{parent}'")]
    DuplicateKey { parent: String, key: String },

    #[error("Unresolved reporting dependency: task '{path}' depends on '{identifier}'")]
    UnresolvedDependency { path: String, identifier: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_full_path() {
        let err = ExecutorError::CircularDependency {
            cycle: vec!["a".into(), "b".into(), "c".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "Circular reporting dependency detected: a -> b -> c -> a"
        );
    }

    #[test]
    fn duplicate_key_at_root_mentions_root() {
        let err = ExecutorError::DuplicateKey {
            parent: "<root>".into(),
            key: "lint".into(),
        };
        assert_eq!(err.to_string(), "Duplicate key 'lint' under '<root>'");
    }
}
