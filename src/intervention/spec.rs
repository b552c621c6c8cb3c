//! Intervention specifications.
//!
//! A sum type over observational, hard, soft, and multiple interventions,
//! with exhaustive matching confined to the serialization boundary; no
//! stringly-typed operation fields leak into business logic.

use std::collections::BTreeSet;

use crate::config::defaults;
use crate::protocol::{InterventionOp, InterventionPayload, SoftTransformOp};

/// How a soft intervention perturbs a variable's natural value.
/// Shift adds `param`; Scale multiplies by `param`. Arbitrary-expression
/// transforms are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftTransform {
    Shift,
    Scale,
}

/// A single hard or soft intervention.
#[derive(Debug, Clone, PartialEq)]
pub enum Intervention {
    /// do-operator: pin the node to a constant, severing its incoming edges
    /// for the query.
    Hard { node: String, value: f64 },
    /// Perturb the node's natural distribution without decoupling it from
    /// its parents.
    Soft {
        node: String,
        transform: SoftTransform,
        param: f64,
    },
}

impl Intervention {
    pub fn node(&self) -> &str {
        match self {
            Self::Hard { node, .. } | Self::Soft { node, .. } => node,
        }
    }

    /// Human-readable form for result metadata.
    pub fn describe(&self) -> String {
        match self {
            Self::Hard { node, value } => format!("do({node} := {value})"),
            Self::Soft {
                node,
                transform: SoftTransform::Shift,
                param,
            } => format!("soft({node} + {param})"),
            Self::Soft {
                node,
                transform: SoftTransform::Scale,
                param,
            } => format!("soft({node} * {param})"),
        }
    }

    fn to_op(&self) -> InterventionOp {
        match self {
            Self::Hard { node, value } => InterventionOp::Hard {
                node: node.clone(),
                value: *value,
            },
            Self::Soft {
                node,
                transform,
                param,
            } => InterventionOp::Soft {
                node: node.clone(),
                transform: match transform {
                    SoftTransform::Shift => SoftTransformOp::Shift,
                    SoftTransform::Scale => SoftTransformOp::Scale,
                },
                param: *param,
            },
        }
    }
}

/// The query variants.
#[derive(Debug, Clone, PartialEq)]
pub enum InterventionKind {
    /// No intervention: sample the unmodified fitted distribution.
    Observational,
    Hard {
        node: String,
        value: f64,
    },
    Soft {
        node: String,
        transform: SoftTransform,
        param: f64,
    },
    /// All listed interventions applied simultaneously in one query.
    Multiple(Vec<Intervention>),
}

/// A full intervention query: the kind plus the shared query controls.
#[derive(Debug, Clone)]
pub struct InterventionSpec {
    pub kind: InterventionKind,
    /// Nodes to report statistics for. `None` means all graph nodes.
    pub query_nodes: Option<BTreeSet<String>>,
    /// Samples to draw; must be positive.
    pub num_samples: usize,
}

impl InterventionSpec {
    pub fn observational() -> Self {
        Self::with_kind(InterventionKind::Observational)
    }

    pub fn hard(node: impl Into<String>, value: f64) -> Self {
        Self::with_kind(InterventionKind::Hard {
            node: node.into(),
            value,
        })
    }

    pub fn soft(node: impl Into<String>, transform: SoftTransform, param: f64) -> Self {
        Self::with_kind(InterventionKind::Soft {
            node: node.into(),
            transform,
            param,
        })
    }

    pub fn multiple(interventions: Vec<Intervention>) -> Self {
        Self::with_kind(InterventionKind::Multiple(interventions))
    }

    fn with_kind(kind: InterventionKind) -> Self {
        Self {
            kind,
            query_nodes: None,
            num_samples: defaults::DEFAULT_NUM_SAMPLES,
        }
    }

    pub fn with_query_nodes(mut self, nodes: impl IntoIterator<Item = String>) -> Self {
        self.query_nodes = Some(nodes.into_iter().collect());
        self
    }

    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// The interventions to apply, flattened. Empty for observational.
    pub fn interventions(&self) -> Vec<Intervention> {
        match &self.kind {
            InterventionKind::Observational => Vec::new(),
            InterventionKind::Hard { node, value } => vec![Intervention::Hard {
                node: node.clone(),
                value: *value,
            }],
            InterventionKind::Soft {
                node,
                transform,
                param,
            } => vec![Intervention::Soft {
                node: node.clone(),
                transform: *transform,
                param: *param,
            }],
            InterventionKind::Multiple(interventions) => interventions.clone(),
        }
    }

    /// Every node this spec references: intervention targets and query
    /// nodes. Used for fail-fast validation before any subprocess spawns.
    pub fn referenced_nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .interventions()
            .iter()
            .map(|iv| iv.node().to_string())
            .collect();
        if let Some(query_nodes) = &self.query_nodes {
            nodes.extend(query_nodes.iter().cloned());
        }
        nodes
    }

    /// Wire form. The only place the kind is matched for serialization.
    pub(crate) fn to_payload(&self) -> InterventionPayload {
        InterventionPayload {
            interventions: self.interventions().iter().map(Intervention::to_op).collect(),
            query_nodes: self
                .query_nodes
                .as_ref()
                .map(|nodes| nodes.iter().cloned().collect()),
            num_samples: self.num_samples,
        }
    }
}
