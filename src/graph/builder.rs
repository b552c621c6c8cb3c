//! Graph construction with DAG enforcement: empty, size, endpoint, and
//! cycle checks run locally so failures are instant and cost no engine call.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::stable_graph::NodeIndex;

use crate::config::defaults;
use crate::errors::GraphError;

use super::causal_graph::{CausalGraph, CausalStableGraph};

/// Validating builder for [`CausalGraph`].
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    max_nodes: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            max_nodes: defaults::DEFAULT_MAX_NODES,
        }
    }

    /// Override the node-count performance guard.
    pub fn with_max_nodes(max_nodes: usize) -> Self {
        Self { max_nodes }
    }

    /// Validate a node/edge list and produce an immutable DAG.
    pub fn build(
        &self,
        nodes: Vec<String>,
        edges: Vec<(String, String)>,
    ) -> Result<CausalGraph, GraphError> {
        if nodes.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        if nodes.len() > self.max_nodes {
            return Err(GraphError::TooLarge {
                node_count: nodes.len(),
                max_nodes: self.max_nodes,
            });
        }

        let mut graph = CausalStableGraph::with_capacity(nodes.len(), edges.len());
        let mut node_index: HashMap<String, NodeIndex> = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            if node_index.contains_key(node) {
                return Err(GraphError::DuplicateNode { id: node.clone() });
            }
            let idx = graph.add_node(node.clone());
            node_index.insert(node.clone(), idx);
        }

        // Edge endpoints must name known nodes; duplicates collapse to one
        // edge (the edge relation is a set).
        let mut seen = HashSet::new();
        let mut deduped = Vec::with_capacity(edges.len());
        for (source, target) in edges {
            let Some(&src_idx) = node_index.get(&source) else {
                return Err(GraphError::UnknownNode { node: source });
            };
            let Some(&tgt_idx) = node_index.get(&target) else {
                return Err(GraphError::UnknownNode { node: target });
            };
            if source == target {
                return Err(GraphError::CycleDetected {
                    path: format!("{source} -> {target}"),
                });
            }
            if seen.insert((src_idx, tgt_idx)) {
                graph.add_edge(src_idx, tgt_idx, ());
                deduped.push((source, target));
            }
        }

        if let Some(path) = find_cycle(&graph) {
            return Err(GraphError::CycleDetected {
                path: path.join(" -> "),
            });
        }

        Ok(CausalGraph::from_parts(nodes, deduped, graph, node_index))
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Find one example cycle via Tarjan's SCC, rendered as a node-id path that
/// returns to its starting node. `None` when the graph is a DAG.
fn find_cycle(graph: &CausalStableGraph) -> Option<Vec<String>> {
    let scc = tarjan_scc(graph).into_iter().find(|scc| scc.len() > 1)?;
    let members: HashSet<NodeIndex> = scc.iter().copied().collect();
    let start = scc[0];

    let in_scc_successors = |node: NodeIndex| -> Vec<NodeIndex> {
        graph.neighbors(node).filter(|n| members.contains(n)).collect()
    };

    // Backtracking DFS inside the SCC until an edge leads back to the start.
    // Strong connectivity guarantees such a path exists.
    let mut visited = HashSet::from([start]);
    let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(start, in_scc_successors(start))];
    while let Some((_, successors)) = stack.last_mut() {
        match successors.pop() {
            Some(next) if next == start => {
                let mut path: Vec<NodeIndex> = stack.iter().map(|(node, _)| *node).collect();
                path.push(start);
                return Some(render_path(graph, &path));
            }
            Some(next) => {
                if visited.insert(next) {
                    let next_successors = in_scc_successors(next);
                    stack.push((next, next_successors));
                }
            }
            None => {
                stack.pop();
            }
        }
    }

    // Unreachable for a true SCC; report the component itself rather than
    // silently accepting a cyclic graph.
    let mut path = scc.clone();
    path.push(scc[0]);
    Some(render_path(graph, &path))
}

fn render_path(graph: &CausalStableGraph, path: &[NodeIndex]) -> Vec<String> {
    path.iter()
        .filter_map(|idx| graph.node_weight(*idx).cloned())
        .collect()
}
