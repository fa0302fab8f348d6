use super::node::{VerificationNode, VerificationTree};
use super::path::{is_strict_descendant, join_path, matches_filter};

/// Prune a tree down to the nodes selected by `filters`.
///
/// A node whose own path matches a filter keeps its whole subtree. A node
/// whose path is an ancestor of a filter is kept with only the children that
/// lead to a match. Everything else is dropped. No filters selects everything.
pub fn filter_tree(tree: &VerificationTree, filters: &[String]) -> VerificationTree {
    let filters: Vec<&str> = filters
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    if filters.is_empty() {
        return tree.clone();
    }

    VerificationTree {
        strategy: tree.strategy,
        tasks: filter_nodes(&tree.tasks, None, &filters),
    }
}

fn filter_nodes(
    nodes: &[VerificationNode],
    parent: Option<&str>,
    filters: &[&str],
) -> Vec<VerificationNode> {
    let mut kept = Vec::new();
    for node in nodes {
        let path = join_path(parent, &node.key);

        if filters.iter().any(|f| matches_filter(&path, f)) {
            kept.push(node.clone());
            continue;
        }

        let leads_to_match = filters
            .iter()
            .any(|f| is_strict_descendant(f.trim_end_matches(':'), &path));
        if !leads_to_match || !node.is_group() {
            continue;
        }

        let children = filter_nodes(node.children(), Some(&path), filters);
        if children.is_empty() {
            continue;
        }
        let mut framed = node.clone();
        framed.children = Some(children);
        kept.push(framed);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::RunSpec;

    fn leaf(key: &str) -> VerificationNode {
        VerificationNode::leaf(key, RunSpec::Shell("true".into()))
    }

    fn sample() -> VerificationTree {
        VerificationTree::new(vec![
            VerificationNode::group(
                "lint",
                vec![
                    leaf("eslint"),
                    VerificationNode::group("types", vec![leaf("tsc"), leaf("vue-tsc")]),
                ],
            ),
            leaf("test"),
        ])
    }

    fn paths(tree: &VerificationTree) -> Vec<String> {
        let mut out = Vec::new();
        tree.walk(|path, _| out.push(path.to_string()));
        out
    }

    #[test]
    fn no_filters_keeps_everything() {
        let tree = sample();
        assert_eq!(filter_tree(&tree, &[]), tree);
    }

    #[test]
    fn selecting_a_grandchild_keeps_ancestors_only() {
        let filtered = filter_tree(&sample(), &["lint:types:tsc".to_string()]);
        assert_eq!(paths(&filtered), vec!["lint", "lint:types", "lint:types:tsc"]);
    }

    #[test]
    fn selecting_a_group_keeps_its_subtree() {
        let filtered = filter_tree(&sample(), &["lint".to_string()]);
        assert_eq!(
            paths(&filtered),
            vec![
                "lint",
                "lint:eslint",
                "lint:types",
                "lint:types:tsc",
                "lint:types:vue-tsc"
            ]
        );
    }

    #[test]
    fn multiple_filters_union() {
        let filtered = filter_tree(&sample(), &["test".to_string(), "lint:eslint".to_string()]);
        assert_eq!(paths(&filtered), vec!["lint", "lint:eslint", "test"]);
    }

    #[test]
    fn unknown_filter_selects_nothing() {
        let filtered = filter_tree(&sample(), &["deploy".to_string()]);
        assert!(filtered.is_empty());
    }

    #[test]
    fn prefix_of_a_key_is_not_a_match() {
        let filtered = filter_tree(&sample(), &["lin".to_string()]);
        assert!(filtered.is_empty());
    }
}
