//! petgraph::StableGraph wrapper with an id → index map for O(1) lookup.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::Dfs;
use petgraph::Directed;

use crate::protocol::GraphPayload;

/// The underlying directed graph type. Node weights are variable ids.
pub type CausalStableGraph = StableGraph<String, (), Directed>;

/// An immutable causal DAG.
///
/// Constructed once by [`crate::graph::GraphBuilder`]; the edge relation is
/// guaranteed acyclic. Shared as `Arc<CausalGraph>` by the facade that
/// created it.
#[derive(Debug)]
pub struct CausalGraph {
    /// Variable ids in insertion order.
    nodes: Vec<String>,
    /// Directed edges (source, target), deduplicated, insertion order.
    edges: Vec<(String, String)>,
    /// The petgraph stable graph.
    graph: CausalStableGraph,
    /// Map from variable id → NodeIndex.
    node_index: HashMap<String, NodeIndex>,
}

impl CausalGraph {
    /// Assemble from builder-validated parts.
    pub(crate) fn from_parts(
        nodes: Vec<String>,
        edges: Vec<(String, String)>,
        graph: CausalStableGraph,
        node_index: HashMap<String, NodeIndex>,
    ) -> Self {
        Self {
            nodes,
            edges,
            graph,
            node_index,
        }
    }

    /// Variable ids in insertion order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Directed edges as (source, target) pairs.
    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.node_index.contains_key(node)
    }

    /// Direct causes of `node`. Empty for roots and unknown nodes.
    pub fn parents_of(&self, node: &str) -> Vec<String> {
        self.neighbors(node, petgraph::Direction::Incoming)
    }

    /// Direct effects of `node`.
    pub fn children_of(&self, node: &str) -> Vec<String> {
        self.neighbors(node, petgraph::Direction::Outgoing)
    }

    /// Nodes with no incoming edges, in node order.
    pub fn root_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| self.parents_of(n).is_empty())
            .cloned()
            .collect()
    }

    /// Nodes with at least one parent, in node order. These are the nodes a
    /// fitted SCM must carry mechanisms for.
    pub fn non_root_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| !self.parents_of(n).is_empty())
            .cloned()
            .collect()
    }

    /// All nodes downstream of `node` (excluding itself), in node order.
    /// Returns `None` for an unknown node.
    pub fn descendants_of(&self, node: &str) -> Option<Vec<String>> {
        let start = *self.node_index.get(node)?;
        let mut reached = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != start {
                reached.push(idx);
            }
        }
        // NodeIndex order matches insertion order, so sorting by index gives
        // deterministic node-order output.
        reached.sort();
        Some(
            reached
                .into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).cloned())
                .collect(),
        )
    }

    /// blake3 content hash of nodes + edges + optional data fingerprint.
    /// Used as the fitted-model cache key.
    pub fn content_hash(&self, data_fingerprint: Option<&str>) -> String {
        let mut hasher = blake3::Hasher::new();
        for node in &self.nodes {
            hasher.update(node.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&[1]);
        for (source, target) in &self.edges {
            hasher.update(source.as_bytes());
            hasher.update(&[0]);
            hasher.update(target.as_bytes());
            hasher.update(&[0]);
        }
        if let Some(fingerprint) = data_fingerprint {
            hasher.update(&[2]);
            hasher.update(fingerprint.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Wire representation for engine requests.
    pub fn to_payload(&self) -> GraphPayload {
        GraphPayload {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    fn neighbors(&self, node: &str, direction: petgraph::Direction) -> Vec<String> {
        let Some(&idx) = self.node_index.get(node) else {
            return Vec::new();
        };
        let mut out: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        out.sort();
        out.into_iter()
            .filter_map(|i| self.graph.node_weight(i).cloned())
            .collect()
    }
}
