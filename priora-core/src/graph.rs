//! Dependency graph and cycle detection.
//!
//! Nodes are task keys, edges point from a task to the tasks it depends on.
//! References that do not name a task in the batch are dropped here; whether
//! they are acceptable is the caller's business.

use std::collections::HashMap;

use serde::Serialize;

use crate::task::Task;

/// Directed dependency graph over one batch.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph. Nodes keep first-appearance order. Records sharing a
    /// key collapse into one node whose edges are the union of theirs.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = Self::default();
        for t in tasks {
            let key = t.key();
            if !graph.index.contains_key(key) {
                graph.index.insert(key.to_string(), graph.nodes.len());
                graph.nodes.push(key.to_string());
                graph.adjacency.push(Vec::new());
            }
        }

        for t in tasks {
            let from = graph.index[t.key()];
            for dep in &t.dependencies {
                let dep = dep.trim();
                let Some(&to) = graph.index.get(dep) else { continue };
                if !graph.adjacency[from].contains(&to) {
                    graph.adjacency[from].push(to);
                }
            }
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Resolved dependencies of `key`, in reference order.
    pub fn dependencies_of(&self, key: &str) -> Vec<&str> {
        self.index
            .get(key)
            .map(|&i| {
                self.adjacency[i]
                    .iter()
                    .map(|&j| self.nodes[j].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Every cycle closed by a back edge during a depth-first walk.
    ///
    /// Roots are tried in node order. A cycle is the slice of the current path
    /// from the revisited node to the node that closes the loop, so `1 -> 2 ->
    /// 3 -> 1` is reported as `["1", "2", "3"]` and a self-loop as `["A"]`.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum VisitState {
            Unvisited,
            InProgress,
            Done,
        }

        let mut state = vec![VisitState::Unvisited; self.nodes.len()];
        let mut cycles = Vec::new();

        // (node, index of the next neighbour to look at)
        let mut stack: Vec<(usize, usize)> = Vec::new();
        // Position of each in-progress node on the current path.
        let mut on_path: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut path: Vec<usize> = Vec::new();

        for root in 0..self.nodes.len() {
            if state[root] != VisitState::Unvisited {
                continue;
            }

            state[root] = VisitState::InProgress;
            on_path[root] = Some(path.len());
            path.push(root);
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                let Some(&nbr) = self.adjacency[node].get(next) else {
                    // All neighbours explored.
                    stack.pop();
                    path.pop();
                    on_path[node] = None;
                    state[node] = VisitState::Done;
                    continue;
                };
                frame.1 += 1;

                match state[nbr] {
                    VisitState::Unvisited => {
                        state[nbr] = VisitState::InProgress;
                        on_path[nbr] = Some(path.len());
                        path.push(nbr);
                        stack.push((nbr, 0));
                    }
                    VisitState::InProgress => {
                        if let Some(start) = on_path[nbr] {
                            cycles.push(
                                path[start..]
                                    .iter()
                                    .map(|&i| self.nodes[i].clone())
                                    .collect(),
                            );
                        }
                    }
                    VisitState::Done => {}
                }
            }
        }

        cycles
    }

    /// Serializable node/edge listing.
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self
                .nodes
                .iter()
                .map(|id| GraphNode { id: id.clone() })
                .collect(),
            edges: self
                .adjacency
                .iter()
                .enumerate()
                .flat_map(|(from, tos)| {
                    tos.iter().map(move |&to| (from, to))
                })
                .map(|(from, to)| GraphEdge {
                    from: self.nodes[from].clone(),
                    to: self.nodes[to].clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Graph metadata returned next to a ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Report the dependency cycles in a batch. An empty result means acyclic.
pub fn detect_cycles(tasks: &[Task]) -> Vec<Vec<String>> {
    let graph = DependencyGraph::from_tasks(tasks);
    let cycles = graph.find_cycles();
    if !cycles.is_empty() {
        tracing::warn!(
            count = cycles.len(),
            nodes = graph.len(),
            "dependency cycles detected"
        );
    }
    cycles
}
