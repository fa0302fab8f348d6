use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::ExecutorError;
use crate::tree::path::{is_same_or_descendant, normalize_identifier, parent_path};
use crate::tree::{join_path, Strategy, VerificationNode, VerificationTree};

/// Static facts about one node, gathered in a single walk of the tree.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub path: String,
    pub key: String,
    /// Identifiers exactly as declared
    pub declared: Vec<String>,
    /// Position among siblings
    pub index: usize,
    pub is_group: bool,
}

/// How a dependency identifier resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Path(String),
    Unresolved,
    Ambiguous(Vec<String>),
}

/// Reporting-dependency graph over task paths.
///
/// Built once per run from the whole tree. Edges point from a dependent to
/// its dependencies, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// path -> node
    nodes: HashMap<String, GraphNode>,

    /// key -> every path carrying that key
    keys: HashMap<String, Vec<String>>,

    /// Dependency edges: path -> dependencies the path waits on
    edges: HashMap<String, Vec<String>>,

    /// Reverse edges: path -> paths that depend on it
    reverse_edges: HashMap<String, Vec<String>>,

    /// Group path ("" for the root) -> strategy applied to its children
    strategies: HashMap<String, Strategy>,

    /// Tree order of every path
    insertion_order: Vec<String>,
}

impl DependencyGraph {
    /// Build the graph, resolve identifiers and reject cycles.
    ///
    /// With `strict` an identifier that does not resolve to exactly one node
    /// is an error; otherwise the edge is dropped with a warning.
    pub fn build(tree: &VerificationTree, strict: bool) -> Result<Self, ExecutorError> {
        let mut graph = Self::default();
        graph.strategies.insert(String::new(), tree.strategy);
        graph.collect(&tree.tasks, None);

        let resolved = graph.resolve_all(strict)?;

        if let Some(cycle) = dependency_cycle(&graph.insertion_order, &resolved) {
            return Err(ExecutorError::CircularDependency { cycle });
        }

        let mut satisfiable: HashMap<String, Vec<String>> = HashMap::new();
        for path in &graph.insertion_order {
            let Some(deps) = resolved.get(path) else {
                continue;
            };
            let mut kept = Vec::with_capacity(deps.len());
            for dep in deps {
                match graph.unsatisfiable(path, dep) {
                    Some(reason) => {
                        tracing::warn!(
                            dependent = %path,
                            dependency = %dep,
                            "ignoring reporting dependency: {reason}"
                        );
                    }
                    None => kept.push(dep.clone()),
                }
            }
            if !kept.is_empty() {
                satisfiable.insert(path.clone(), kept);
            }
        }
        graph.drop_deadlocking_edges(&mut satisfiable);

        for path in &graph.insertion_order {
            let Some(kept) = satisfiable.remove(path) else {
                continue;
            };
            for dep in &kept {
                graph
                    .reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(path.clone());
            }
            graph.edges.insert(path.clone(), kept);
        }

        Ok(graph)
    }

    fn collect(&mut self, nodes: &[VerificationNode], parent: Option<&str>) {
        for (index, node) in nodes.iter().enumerate() {
            let path = join_path(parent, &node.key);
            self.keys
                .entry(node.key.clone())
                .or_default()
                .push(path.clone());
            self.nodes.insert(
                path.clone(),
                GraphNode {
                    path: path.clone(),
                    key: node.key.clone(),
                    declared: node.reporting_depends_on.clone(),
                    index,
                    is_group: node.is_group(),
                },
            );
            self.insertion_order.push(path.clone());

            if node.is_group() {
                self.strategies.insert(path.clone(), node.strategy);
                self.collect(node.children(), Some(&path));
            }
        }
    }

    fn resolve_all(&self, strict: bool) -> Result<HashMap<String, Vec<String>>, ExecutorError> {
        let mut resolved: HashMap<String, Vec<String>> = HashMap::new();
        for path in &self.insertion_order {
            let Some(node) = self.nodes.get(path) else {
                continue;
            };
            let mut deps: Vec<String> = Vec::new();
            for identifier in &node.declared {
                match self.resolve(identifier) {
                    Resolution::Path(dep) => {
                        if !deps.contains(&dep) {
                            deps.push(dep);
                        }
                    }
                    Resolution::Unresolved | Resolution::Ambiguous(_) if strict => {
                        return Err(ExecutorError::UnresolvedDependency {
                            path: path.clone(),
                            identifier: identifier.clone(),
                        });
                    }
                    Resolution::Unresolved => {
                        tracing::warn!(
                            dependent = %path,
                            identifier = %identifier,
                            "reporting dependency does not match any task; ignoring it"
                        );
                    }
                    Resolution::Ambiguous(candidates) => {
                        tracing::warn!(
                            dependent = %path,
                            identifier = %identifier,
                            candidates = ?candidates,
                            "reporting dependency matches several tasks by key; use a full path"
                        );
                    }
                }
            }
            if !deps.is_empty() {
                resolved.insert(path.clone(), deps);
            }
        }
        Ok(resolved)
    }

    /// Resolve an identifier: exact path first, then dotted path, then unique key.
    pub fn resolve(&self, identifier: &str) -> Resolution {
        if self.nodes.contains_key(identifier) {
            return Resolution::Path(identifier.to_string());
        }
        let normalized = normalize_identifier(identifier);
        if normalized != identifier && self.nodes.contains_key(&normalized) {
            return Resolution::Path(normalized);
        }
        match self.keys.get(identifier).map(Vec::as_slice) {
            Some([only]) => Resolution::Path(only.clone()),
            Some(many) if many.len() > 1 => Resolution::Ambiguous(many.to_vec()),
            _ => Resolution::Unresolved,
        }
    }

    /// Why waiting on `dep` from `path` could never finish, if so.
    fn unsatisfiable(&self, path: &str, dep: &str) -> Option<&'static str> {
        if is_same_or_descendant(path, dep) {
            return Some("a task cannot wait on a group that contains it");
        }
        if is_same_or_descendant(dep, path) {
            return Some("a group cannot wait on one of its own descendants");
        }

        let container = common_container(path, dep);
        let strategy = self
            .strategies
            .get(container)
            .copied()
            .unwrap_or_default();
        if !strategy.is_ordered() {
            return None;
        }
        let own = self.nodes.get(&branch_under(container, path))?;
        let other = self.nodes.get(&branch_under(container, dep))?;
        if other.index > own.index {
            return Some("the dependency runs after this task under an ordered strategy");
        }
        None
    }

    /// Drop edges that would leave a leaf waiting forever.
    ///
    /// Each pass finds one cycle in the wait graph and removes the last
    /// dependency edge on it, until no cycle is left.
    fn drop_deadlocking_edges(&self, deps: &mut HashMap<String, Vec<String>>) {
        while let Some((dependent, dependency)) = self.deadlocking_edge(deps) {
            tracing::warn!(
                dependent = %dependent,
                dependency = %dependency,
                "ignoring reporting dependency: its wait could never finish under the enclosing strategies"
            );
            if let Some(list) = deps.get_mut(&dependent) {
                list.retain(|d| *d != dependency);
                if list.is_empty() {
                    deps.remove(&dependent);
                }
            }
        }
    }

    fn deadlocking_edge(&self, deps: &HashMap<String, Vec<String>>) -> Option<(String, String)> {
        let waits = self.wait_edges(deps);
        let order: Vec<WaitPoint<'_>> = self
            .insertion_order
            .iter()
            .map(|p| WaitPoint::Done(p.as_str()))
            .collect();
        let cycle = detect_cycle(&order, &waits)?;
        cycle.windows(2).rev().find_map(|pair| match (pair[0], pair[1]) {
            (WaitPoint::Done(from), WaitPoint::Done(to))
                if self.nodes.get(from).is_some_and(|n| !n.is_group)
                    && deps.get(from).is_some_and(|d| d.iter().any(|x| x == to)) =>
            {
                Some((from.to_string(), to.to_string()))
            }
            _ => None,
        })
    }

    /// What each point in a run blocks on.
    ///
    /// A node starts once its parent started and, under an ordered strategy,
    /// once its previous sibling is done. A group is done when its children
    /// are. A leaf is done when its process exited and its own dependencies
    /// have results.
    fn wait_edges<'a>(
        &'a self,
        deps: &'a HashMap<String, Vec<String>>,
    ) -> HashMap<WaitPoint<'a>, Vec<WaitPoint<'a>>> {
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for path in &self.insertion_order {
            children
                .entry(parent_path(path).unwrap_or(""))
                .or_default()
                .push(path.as_str());
        }

        let mut waits: HashMap<WaitPoint<'a>, Vec<WaitPoint<'a>>> = HashMap::new();
        for path in &self.insertion_order {
            let path = path.as_str();
            let Some(node) = self.nodes.get(path) else {
                continue;
            };
            let container = parent_path(path).unwrap_or("");

            let start = waits.entry(WaitPoint::Start(path)).or_default();
            if let Some(parent) = parent_path(path) {
                start.push(WaitPoint::Start(parent));
            }
            let ordered = self
                .strategies
                .get(container)
                .copied()
                .unwrap_or_default()
                .is_ordered();
            if ordered && node.index > 0 {
                if let Some(previous) = children.get(container).and_then(|c| c.get(node.index - 1)) {
                    start.push(WaitPoint::Done(*previous));
                }
            }

            let done = waits.entry(WaitPoint::Done(path)).or_default();
            done.push(WaitPoint::Start(path));
            if node.is_group {
                done.extend(children.get(path).into_iter().flatten().map(|c| WaitPoint::Done(*c)));
            } else {
                done.extend(
                    deps.get(path)
                        .into_iter()
                        .flatten()
                        .map(|d| WaitPoint::Done(d.as_str())),
                );
            }
        }
        waits
    }

    pub fn node(&self, path: &str) -> Option<&GraphNode> {
        self.nodes.get(path)
    }

    /// Dependencies of `path` in declaration order.
    pub fn dependencies(&self, path: &str) -> &[String] {
        self.edges.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Paths that declared `path` as a dependency.
    pub fn dependents(&self, path: &str) -> &[String] {
        self.reverse_edges
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every path in tree order.
    pub fn paths(&self) -> &[String] {
        &self.insertion_order
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

/// Deepest group path containing both `a` and `b` ("" for the root).
fn common_container<'a>(a: &'a str, b: &str) -> &'a str {
    let mut candidate = parent_path(a);
    while let Some(group) = candidate {
        if is_same_or_descendant(b, group) {
            return group;
        }
        candidate = parent_path(group);
    }
    ""
}

/// Path of the direct child of `container` on the way to `path`.
fn branch_under(container: &str, path: &str) -> String {
    let rest = if container.is_empty() {
        path
    } else {
        &path[container.len() + 1..]
    };
    let key = rest.split(':').next().unwrap_or(rest);
    join_path(Some(container), key)
}

/// A point in a run another point can block on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WaitPoint<'a> {
    Start(&'a str),
    Done(&'a str),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

fn dependency_cycle(order: &[String], edges: &HashMap<String, Vec<String>>) -> Option<Vec<String>> {
    let order: Vec<&str> = order.iter().map(String::as_str).collect();
    let edges: HashMap<&str, Vec<&str>> = edges
        .iter()
        .map(|(path, deps)| (path.as_str(), deps.iter().map(String::as_str).collect()))
        .collect();
    let cycle = detect_cycle(&order, &edges)?;
    Some(cycle.into_iter().map(str::to_string).collect())
}

/// Three-colour DFS. Returns the full cycle, first node repeated at the end.
fn detect_cycle<N>(order: &[N], edges: &HashMap<N, Vec<N>>) -> Option<Vec<N>>
where
    N: Copy + Eq + Hash,
{
    let mut colors: HashMap<N, Color> = HashMap::new();
    let mut stack: Vec<N> = Vec::new();

    for &start in order {
        if colors.get(&start).copied().unwrap_or(Color::White) == Color::White {
            if let Some(cycle) = dfs_cycle(start, edges, &mut colors, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn dfs_cycle<N>(
    node: N,
    edges: &HashMap<N, Vec<N>>,
    colors: &mut HashMap<N, Color>,
    stack: &mut Vec<N>,
) -> Option<Vec<N>>
where
    N: Copy + Eq + Hash,
{
    colors.insert(node, Color::Gray);
    stack.push(node);

    for &next in edges.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
        match colors.get(&next).copied().unwrap_or(Color::White) {
            Color::Gray => {
                let pos = stack.iter().position(|p| *p == next)?;
                let mut cycle = stack[pos..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            Color::White => {
                if let Some(cycle) = dfs_cycle(next, edges, colors, stack) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }

    stack.pop();
    colors.insert(node, Color::Black);
    None
}

/// Every identifier that resolves, for listing purposes. Unresolved ones map to `None`.
pub fn describe_dependencies(graph: &DependencyGraph, path: &str) -> Vec<(String, Option<String>)> {
    let Some(node) = graph.node(path) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    node.declared
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .map(|id| match graph.resolve(id) {
            Resolution::Path(p) => (id.clone(), Some(p)),
            _ => (id.clone(), None),
        })
        .collect()
}
