//! The import graph engine.
//!
//! Uses petgraph to hold file-to-import edges and finds cycles with a
//! depth-first search that tracks the active recursion stack.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::types::{DependencyEdge, EdgeKind};

/// Directed graph keyed by node identifier (file path or import string).
#[derive(Debug, Default)]
pub struct ImportGraph {
    graph: DiGraph<String, EdgeKind>,
    index: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from edges, following each edge's [`DependencyEdge::target`].
    pub fn from_edges<'a>(
        keys: impl IntoIterator<Item = &'a str>,
        edges: &[DependencyEdge],
    ) -> Self {
        let mut graph = Self::new();
        for key in keys {
            graph.add_node(key);
        }
        for edge in edges {
            graph.add_edge(&edge.from, edge.target(), edge.kind);
        }
        graph
    }

    /// Add a node, or return the existing one with this key.
    pub fn add_node(&mut self, key: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(key) {
            return idx;
        }
        let idx = self.graph.add_node(key.to_string());
        self.index.insert(key.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.graph.add_edge(from, to, kind);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing neighbors in edge insertion order.
    fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        // petgraph yields the most recently added edge first.
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        out.reverse();
        out
    }

    /// Cycles found by a single DFS pass.
    ///
    /// Each node is visited once. Reaching a node that is still on the
    /// recursion stack records the path from that node's position to the
    /// current node, closed by repeating the first node. Cycles through an
    /// already finished node are not reported again, so the result is not
    /// an exhaustive enumeration.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for idx in self.graph.node_indices() {
            if !visited.contains(&idx) {
                self.dfs(idx, &mut visited, &mut on_stack, &mut path, &mut cycles);
            }
        }

        debug!(cycles = cycles.len(), "cycle detection finished");
        cycles
    }

    fn dfs(
        &self,
        idx: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        on_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(idx);
        on_stack.insert(idx);
        path.push(idx);

        for next in self.successors(idx) {
            if !visited.contains(&next) {
                self.dfs(next, visited, on_stack, path, cycles);
            } else if on_stack.contains(&next) {
                if let Some(start) = path.iter().position(|&n| n == next) {
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|&n| self.graph[n].clone()).collect();
                    cycle.push(self.graph[next].clone());
                    cycles.push(cycle);
                }
            }
        }

        path.pop();
        on_stack.remove(&idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(edges: &[(&str, &str)]) -> ImportGraph {
        let mut graph = ImportGraph::new();
        for (from, to) in edges {
            graph.add_edge(from, to, EdgeKind::Import);
        }
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = ImportGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn test_three_node_cycle() {
        let graph = graph_of(&[("a.js", "b.js"), ("b.js", "c.js"), ("c.js", "a.js")]);
        assert_eq!(
            graph.find_cycles(),
            vec![vec!["a.js", "b.js", "c.js", "a.js"]]
        );
    }

    #[test]
    fn test_self_import() {
        let graph = graph_of(&[("a.js", "a.js")]);
        assert_eq!(graph.find_cycles(), vec![vec!["a.js", "a.js"]]);
    }

    #[test]
    fn test_acyclic_chain() {
        let graph = graph_of(&[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(graph.find_cycles().is_empty());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_cycle_starting_mid_path() {
        // entry -> x -> y -> x: only the x..y part is a cycle.
        let graph = graph_of(&[("entry", "x"), ("x", "y"), ("y", "x")]);
        assert_eq!(graph.find_cycles(), vec![vec!["x", "y", "x"]]);
    }

    #[test]
    fn test_neighbors_follow_insertion_order() {
        // Two cycles through "a"; DFS must take a->b before a->c.
        let graph = graph_of(&[("a", "b"), ("a", "c"), ("b", "a"), ("c", "a")]);
        assert_eq!(
            graph.find_cycles(),
            vec![vec!["a", "b", "a"], vec!["a", "c", "a"]]
        );
    }

    #[test]
    fn test_finished_node_not_revisited() {
        // b is finished before c reaches it, so the b<->d cycle is reported
        // once and c->b adds nothing.
        let graph = graph_of(&[("a", "b"), ("b", "d"), ("d", "b"), ("a", "c"), ("c", "b")]);
        assert_eq!(graph.find_cycles(), vec![vec!["b", "d", "b"]]);
    }

    #[test]
    fn test_unresolved_imports_do_not_close_cycles() {
        let graph = graph_of(&[("src/a.ts", "./b"), ("src/b.ts", "./a")]);
        assert!(graph.find_cycles().is_empty());
    }
}
