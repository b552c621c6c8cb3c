//! InterventionEngine: do-operator queries against a fitted SCM, delegated
//! to the external engine through the breaker-wrapped transport.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::bridge::EngineTransport;
use crate::config::CausalConfig;
use crate::errors::InterventionError;
use crate::fit::FittedSCM;
use crate::protocol::{
    self, EngineConfigPayload, EngineRequest, NodeStatistics, Operation, VariableType,
};

use super::spec::{Intervention, InterventionSpec};

/// Query execution metadata.
#[derive(Debug, Clone, Serialize)]
pub struct InterventionMetadata {
    pub num_samples: usize,
    pub interventions_applied: Vec<String>,
    pub query_time_ms: u64,
}

/// Post-intervention distribution estimates for the requested nodes.
#[derive(Debug, Clone, Serialize)]
pub struct InterventionResult {
    pub statistics: HashMap<String, NodeStatistics>,
    pub metadata: InterventionMetadata,
    pub warnings: Vec<String>,
}

/// Executes intervention queries. Caller-input errors fail fast with zero
/// engine calls; engine-side failures degrade to
/// [`InterventionError::Unavailable`].
pub struct InterventionEngine {
    transport: Arc<dyn EngineTransport>,
    config: CausalConfig,
}

impl InterventionEngine {
    pub fn new(transport: Arc<dyn EngineTransport>, config: CausalConfig) -> Self {
        Self { transport, config }
    }

    /// Estimate post-intervention distributions for `spec` against `scm`.
    pub fn intervene(
        &self,
        scm: &FittedSCM,
        spec: &InterventionSpec,
    ) -> Result<InterventionResult, InterventionError> {
        if spec.num_samples == 0 {
            return Err(InterventionError::InvalidSamples);
        }

        let graph = scm.graph();
        for node in spec.referenced_nodes() {
            if !graph.contains(&node) {
                return Err(InterventionError::UnknownNode { node });
            }
        }
        for intervention in spec.interventions() {
            check_value_type(scm, &intervention)?;
        }

        let request = EngineRequest {
            graph: graph.to_payload(),
            traces: None,
            operation: Operation::Intervene,
            intervention: Some(spec.to_payload()),
            config: EngineConfigPayload::from(&self.config),
        };

        let start = Instant::now();
        let envelope = self.transport.call(&request, self.config.call_timeout())?;
        let response = protocol::decode_intervene(&envelope)?;

        // Every requested query node must have a statistics entry.
        let requested: Vec<String> = match &spec.query_nodes {
            Some(nodes) => nodes.iter().cloned().collect(),
            None => graph.nodes().to_vec(),
        };
        let missing: Vec<String> = requested
            .iter()
            .filter(|node| !response.statistics.contains_key(*node))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(InterventionError::IncompletePayload { missing });
        }

        let applied: Vec<String> = spec
            .interventions()
            .iter()
            .map(Intervention::describe)
            .collect();
        let metadata = InterventionMetadata {
            num_samples: response.metadata.num_samples.unwrap_or(spec.num_samples),
            interventions_applied: applied,
            query_time_ms: response
                .metadata
                .query_time_ms
                .unwrap_or(start.elapsed().as_millis() as u64),
        };

        let mut warnings = response.warnings;
        warnings.extend(response.metadata.warnings);

        info!(
            "intervention query complete: {} interventions, {} nodes, {}ms",
            metadata.interventions_applied.len(),
            response.statistics.len(),
            metadata.query_time_ms
        );

        Ok(InterventionResult {
            statistics: response.statistics,
            metadata,
            warnings,
        })
    }
}

/// Check an intervention value against the engine-reported variable type,
/// when that metadata exists. Absent metadata means continuous.
fn check_value_type(
    scm: &FittedSCM,
    intervention: &Intervention,
) -> Result<(), InterventionError> {
    let node = intervention.node();
    let Some(var_type) = scm.variable_type(node) else {
        return Ok(());
    };
    match (intervention, var_type) {
        (Intervention::Hard { value, .. }, VariableType::Binary)
            if *value != 0.0 && *value != 1.0 =>
        {
            Err(InterventionError::TypeMismatch {
                node: node.to_string(),
                expected: "binary (0 or 1)".into(),
                actual: value.to_string(),
            })
        }
        (Intervention::Hard { value, .. }, VariableType::Categorical) => {
            Err(InterventionError::TypeMismatch {
                node: node.to_string(),
                expected: "categorical level".into(),
                actual: value.to_string(),
            })
        }
        (Intervention::Soft { .. }, VariableType::Binary | VariableType::Categorical) => {
            Err(InterventionError::TypeMismatch {
                node: node.to_string(),
                expected: "continuous variable for soft transforms".into(),
                actual: format!("{var_type:?}").to_lowercase(),
            })
        }
        _ => Ok(()),
    }
}
