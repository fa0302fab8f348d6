use std::collections::HashSet;

use super::node::{VerificationNode, VerificationTree};
use super::path::{join_path, PATH_SEPARATOR};
use crate::error::ExecutorError;

/// Structural checks run before the dependency graph is built.
pub fn validate_tree(tree: &VerificationTree) -> Result<(), ExecutorError> {
    validate_level(&tree.tasks, None)
}

fn validate_level(nodes: &[VerificationNode], parent: Option<&str>) -> Result<(), ExecutorError> {
    let mut seen = HashSet::new();
    for node in nodes {
        let path = join_path(parent, &node.key);

        if node.key.trim().is_empty() {
            return Err(ExecutorError::InvalidNode {
                path: parent.unwrap_or("<root>").to_string(),
                reason: "task key must not be empty".to_string(),
            });
        }
        if node.key.contains(PATH_SEPARATOR) {
            return Err(ExecutorError::InvalidNode {
                path,
                reason: format!("task key must not contain '{PATH_SEPARATOR}'"),
            });
        }
        if !seen.insert(node.key.as_str()) {
            return Err(ExecutorError::DuplicateKey {
                parent: parent.unwrap_or("<root>").to_string(),
                key: node.key.clone(),
            });
        }
        if node.run.is_some() && node.children.is_some() {
            return Err(ExecutorError::InvalidNode {
                path,
                reason: "a task has either `run` or `children`, not both".to_string(),
            });
        }

        validate_level(node.children(), Some(&path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::RunSpec;

    fn leaf(key: &str) -> VerificationNode {
        VerificationNode::leaf(key, RunSpec::Shell("true".into()))
    }

    #[test]
    fn accepts_well_formed_tree() {
        let tree = VerificationTree::new(vec![
            VerificationNode::group("lint", vec![leaf("a"), leaf("b")]),
            VerificationNode::group("test", vec![leaf("a")]),
            VerificationNode {
                key: "noop".into(),
                ..Default::default()
            },
        ]);
        assert!(validate_tree(&tree).is_ok());
    }

    #[test]
    fn rejects_duplicate_siblings() {
        let tree = VerificationTree::new(vec![VerificationNode::group(
            "lint",
            vec![leaf("a"), leaf("a")],
        )]);
        assert_eq!(
            validate_tree(&tree),
            Err(ExecutorError::DuplicateKey {
                parent: "lint".into(),
                key: "a".into()
            })
        );
    }

    #[test]
    fn rejects_separator_in_key() {
        let tree = VerificationTree::new(vec![leaf("a:b")]);
        assert!(matches!(
            validate_tree(&tree),
            Err(ExecutorError::InvalidNode { path, .. }) if path == "a:b"
        ));
    }

    #[test]
    fn rejects_empty_key() {
        let tree = VerificationTree::new(vec![VerificationNode::group("g", vec![leaf("")])]);
        assert!(matches!(
            validate_tree(&tree),
            Err(ExecutorError::InvalidNode { path, .. }) if path == "g"
        ));
    }

    #[test]
    fn rejects_run_with_children() {
        let mut node = VerificationNode::group("g", vec![leaf("a")]);
        node.run = Some(RunSpec::Shell("true".into()));
        let tree = VerificationTree::new(vec![node]);
        assert!(matches!(
            validate_tree(&tree),
            Err(ExecutorError::InvalidNode { path, .. }) if path == "g"
        ));
    }
}
