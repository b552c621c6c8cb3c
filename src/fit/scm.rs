//! Fitted structural causal model: engine-produced mechanisms plus fit
//! quality, bound to the graph that produced it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::CausalGraph;
use crate::protocol::VariableType;

/// A fitted SCM.
///
/// Produced once by [`crate::fit::SCMFitter`] from a successful engine call;
/// immutable thereafter. Mechanisms are opaque descriptors owned by the
/// engine: this side never constructs or interprets them, only round-trips
/// them back on intervention requests.
#[derive(Debug, Clone)]
pub struct FittedSCM {
    graph: Arc<CausalGraph>,
    mechanisms: HashMap<String, serde_json::Value>,
    variable_types: HashMap<String, VariableType>,
    r2_scores: HashMap<String, f64>,
    mean_r2: f64,
    warnings: Vec<String>,
}

impl FittedSCM {
    pub(crate) fn new(
        graph: Arc<CausalGraph>,
        mechanisms: HashMap<String, serde_json::Value>,
        variable_types: HashMap<String, VariableType>,
        r2_scores: HashMap<String, f64>,
        mean_r2: f64,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            graph,
            mechanisms,
            variable_types,
            r2_scores,
            mean_r2,
            warnings,
        }
    }

    /// The graph this model was fitted against.
    pub fn graph(&self) -> &Arc<CausalGraph> {
        &self.graph
    }

    pub fn mechanisms(&self) -> &HashMap<String, serde_json::Value> {
        &self.mechanisms
    }

    pub fn mechanism(&self, node: &str) -> Option<&serde_json::Value> {
        self.mechanisms.get(node)
    }

    /// Per-node R² in [0, 1].
    pub fn r2_scores(&self) -> &HashMap<String, f64> {
        &self.r2_scores
    }

    pub fn r2_score(&self, node: &str) -> Option<f64> {
        self.r2_scores.get(node).copied()
    }

    /// Mean of the per-node R² scores.
    pub fn mean_r2(&self) -> f64 {
        self.mean_r2
    }

    /// Engine-reported variable type, when that metadata exists.
    pub fn variable_type(&self, node: &str) -> Option<VariableType> {
        self.variable_types.get(node).copied()
    }

    /// Data-quality warnings attached at fit time.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
