//! Dependency graph over mini-app names.
//!
//! Nodes are indexed in declaration order. Ordering uses Kahn's algorithm
//! with a min-ordered ready set, so among nodes whose dependencies are all
//! satisfied the one declared first always goes first.

use std::collections::{BTreeSet, HashMap};

use homogen_core::{HomogenError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A validated, acyclic dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    /// `dependencies[i]`: nodes `i` consumes, deduplicated, in declared order.
    dependencies: Vec<Vec<usize>>,
    /// `dependents[i]`: nodes that consume `i`.
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build and validate a graph from `(name, requires)` pairs in
    /// declaration order.
    ///
    /// Checks run in this order: duplicate names, undeclared dependencies,
    /// cycles.
    pub fn build<'a, I>(nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let nodes: Vec<(&str, &[String])> = nodes.into_iter().collect();

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, (name, _)) in nodes.iter().enumerate() {
            if index.insert(name.to_string(), i).is_some() {
                return Err(HomogenError::configuration(format!(
                    "'{}' is declared more than once",
                    name
                )));
            }
        }

        let mut dependencies = Vec::with_capacity(nodes.len());
        let mut dependents = vec![Vec::new(); nodes.len()];
        for (i, (name, requires)) in nodes.iter().enumerate() {
            let mut deps: Vec<usize> = Vec::with_capacity(requires.len());
            for dep in requires.iter() {
                let Some(&j) = index.get(dep.as_str()) else {
                    return Err(HomogenError::missing(*name, dep.as_str()));
                };
                if !deps.contains(&j) {
                    deps.push(j);
                    dependents[j].push(i);
                }
            }
            dependencies.push(deps);
        }

        let graph = Self {
            names: nodes.iter().map(|(name, _)| name.to_string()).collect(),
            index,
            dependencies,
            dependents,
        };
        if let Some(cycle) = graph.find_cycle() {
            return Err(HomogenError::CyclicDependency { cycle });
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn dependencies(&self, node: usize) -> &[usize] {
        &self.dependencies[node]
    }

    pub fn dependents(&self, node: usize) -> &[usize] {
        &self.dependents[node]
    }

    /// Every node in dependency order, ties broken by declaration order.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = (0..self.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &next in &self.dependents[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }
        order
    }

    /// `node` and every node that transitively depends on it, in
    /// dependency order.
    pub fn invalidation_set(&self, node: usize) -> Vec<usize> {
        let mut marked = vec![false; self.len()];
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if !marked[n] {
                marked[n] = true;
                stack.extend(self.dependents[n].iter().copied());
            }
        }
        self.topological_order()
            .into_iter()
            .filter(|&n| marked[n])
            .collect()
    }

    /// Color-based DFS along dependency edges. Returns the first cycle found
    /// as a closed path, e.g. `[A, B, A]`.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut color = vec![Color::White; self.len()];

        for start in 0..self.len() {
            if color[start] != Color::White {
                continue;
            }
            // (node, position of the next dependency to visit)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            color[start] = Color::Gray;

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let Some(&dep) = self.dependencies[node].get(top.1) else {
                    color[node] = Color::Black;
                    stack.pop();
                    continue;
                };
                top.1 += 1;

                match color[dep] {
                    Color::White => {
                        color[dep] = Color::Gray;
                        stack.push((dep, 0));
                    }
                    Color::Gray => {
                        let from = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                        let mut cycle: Vec<String> = stack[from..]
                            .iter()
                            .map(|&(n, _)| self.names[n].clone())
                            .collect();
                        cycle.push(self.names[dep].clone());
                        return Some(cycle);
                    }
                    Color::Black => {}
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(nodes: &[(&str, &[&str])]) -> Result<DependencyGraph> {
        let owned: Vec<(String, Vec<String>)> = nodes
            .iter()
            .map(|(n, deps)| (n.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect();
        DependencyGraph::build(owned.iter().map(|(n, d)| (n.as_str(), d.as_slice())))
    }

    fn order(graph: &DependencyGraph) -> Vec<&str> {
        graph
            .topological_order()
            .into_iter()
            .map(|i| graph.name(i))
            .collect()
    }

    #[test]
    fn dependencies_come_first() {
        let g = build(&[("B", &["A"]), ("A", &["corr_1"]), ("corr_1", &[])]).unwrap();
        assert_eq!(order(&g), vec!["corr_1", "A", "B"]);
    }

    #[test]
    fn ties_follow_declaration_order() {
        let g = build(&[("z", &[]), ("y", &["z"]), ("a", &[]), ("m", &[])]).unwrap();
        assert_eq!(order(&g), vec!["z", "y", "a", "m"]);

        let g = build(&[("c", &["x"]), ("b", &[]), ("x", &[])]).unwrap();
        assert_eq!(order(&g), vec!["b", "x", "c"]);
    }

    #[test]
    fn order_is_deterministic() {
        let nodes: &[(&str, &[&str])] = &[
            ("d", &["a", "b"]),
            ("c", &["a"]),
            ("b", &[]),
            ("a", &[]),
        ];
        let first = order(&build(nodes).unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        for _ in 0..10 {
            let again = build(nodes).unwrap();
            assert_eq!(order(&again), first);
        }
        assert_eq!(first, vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn two_cycle_reports_path() {
        let err = build(&[("A", &["B"]), ("B", &["A"])]).unwrap_err();
        match err {
            HomogenError::CyclicDependency { cycle } => assert_eq!(cycle, vec!["A", "B", "A"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = build(&[("A", &["A"])]).unwrap_err();
        assert_eq!(err.to_string(), "cyclic dependency: A -> A");
    }

    #[test]
    fn longer_cycle_behind_acyclic_prefix() {
        let err = build(&[
            ("root", &["x"]),
            ("x", &["y"]),
            ("y", &["z"]),
            ("z", &["x"]),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "cyclic dependency: x -> y -> z -> x");
    }

    #[test]
    fn missing_dependency_reported_before_cycle() {
        let err = build(&[("A", &["B"]), ("B", &["A", "ghost"])]).unwrap_err();
        match err {
            HomogenError::MissingDependency { name, dependency } => {
                assert_eq!(name, "B");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = build(&[("A", &[]), ("A", &[])]).unwrap_err();
        assert!(matches!(err, HomogenError::Configuration(_)));
    }

    #[test]
    fn repeated_requirement_counts_once() {
        let g = build(&[("a", &[]), ("b", &["a", "a"])]).unwrap();
        assert_eq!(g.dependencies(1), &[0]);
        assert_eq!(order(&g), vec!["a", "b"]);
    }

    #[test]
    fn invalidation_covers_transitive_dependents() {
        let g = build(&[
            ("corr_1", &[]),
            ("corr_2", &[]),
            ("A", &["corr_1"]),
            ("B", &["A"]),
            ("C", &["corr_2"]),
        ])
        .unwrap();
        let names: Vec<&str> = g
            .invalidation_set(0)
            .into_iter()
            .map(|i| g.name(i))
            .collect();
        assert_eq!(names, vec!["corr_1", "A", "B"]);
    }

    #[test]
    fn empty_graph() {
        let g = build(&[]).unwrap();
        assert!(g.is_empty());
        assert!(g.topological_order().is_empty());
    }
}
