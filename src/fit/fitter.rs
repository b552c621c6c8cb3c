//! SCMFitter: local precondition checks, engine-delegated fitting, and the
//! R² quality policy.

use std::sync::Arc;

use tracing::info;

use crate::bridge::EngineTransport;
use crate::config::{defaults, CausalConfig};
use crate::errors::FitError;
use crate::graph::CausalGraph;
use crate::protocol::{self, EngineConfigPayload, EngineRequest, Operation};

use super::scm::FittedSCM;
use super::traces::TraceData;

/// Fits a structural causal model by delegating to the external engine.
///
/// Fitting is an optional enhancement: every bridge-layer failure maps to
/// [`FitError::Unavailable`] so callers degrade instead of crashing.
pub struct SCMFitter {
    transport: Arc<dyn EngineTransport>,
    config: CausalConfig,
}

impl SCMFitter {
    pub fn new(transport: Arc<dyn EngineTransport>, config: CausalConfig) -> Self {
        Self { transport, config }
    }

    /// Fit `graph` against optional observation data.
    pub fn fit(
        &self,
        graph: &Arc<CausalGraph>,
        traces: Option<&TraceData>,
    ) -> Result<FittedSCM, FitError> {
        let mut warnings = Vec::new();

        if let Some(traces) = traces {
            let missing: Vec<String> = graph
                .nodes()
                .iter()
                .filter(|node| !traces.has_column(node))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(FitError::MissingTraceData { nodes: missing });
            }

            let rows = traces.num_rows();
            if rows < self.config.min_samples {
                warnings.push(format!(
                    "insufficient samples: {rows} rows (minimum {})",
                    self.config.min_samples
                ));
            }
            for column in traces.near_constant_columns(defaults::DEFAULT_NEAR_CONSTANT_EPSILON) {
                warnings.push(format!("near-constant variable: {column}"));
            }
        }

        let request = EngineRequest {
            graph: graph.to_payload(),
            traces: traces.map(|t| t.columns().clone()),
            operation: Operation::Fit,
            intervention: None,
            config: EngineConfigPayload::from(&self.config),
        };

        let envelope = self.transport.call(&request, self.config.call_timeout())?;
        let fit = protocol::decode_fit(&envelope)?;

        // Every non-root node needs a mechanism and a score; a partial model
        // would silently mis-answer intervention queries later.
        let non_roots = graph.non_root_nodes();
        let missing_mechanisms: Vec<&String> = non_roots
            .iter()
            .filter(|node| !fit.scm.mechanisms.contains_key(*node))
            .collect();
        if !missing_mechanisms.is_empty() {
            return Err(FitError::IncompletePayload {
                reason: format!(
                    "missing mechanisms for: {}",
                    join_ids(&missing_mechanisms)
                ),
            });
        }
        let missing_scores: Vec<&String> = non_roots
            .iter()
            .filter(|node| !fit.validation.r2_scores.contains_key(*node))
            .collect();
        if !missing_scores.is_empty() {
            return Err(FitError::IncompletePayload {
                reason: format!("missing r2 scores for: {}", join_ids(&missing_scores)),
            });
        }

        // mean_r2 is recomputed locally so the invariant "mean of r2_scores"
        // holds even against a sloppy engine. The engine's figure is only
        // used when there is nothing to average (root-only graph).
        let scores = &fit.validation.r2_scores;
        let mean_r2 = if scores.is_empty() {
            fit.validation.mean_r2
        } else {
            scores.values().sum::<f64>() / scores.len() as f64
        };

        warnings.extend(fit.validation.warnings);
        if mean_r2 < self.config.r2_warning_threshold {
            warnings.push(format!(
                "low fit quality: mean r2 {mean_r2:.3} below {:.3}",
                self.config.r2_warning_threshold
            ));
        }
        if self.config.validate_r2 && mean_r2 < self.config.r2_threshold {
            return Err(FitError::LowQualityFit {
                mean_r2,
                threshold: self.config.r2_threshold,
            });
        }

        info!(
            "scm fit complete: {} nodes, {} mechanisms, mean r2 {:.3}",
            graph.node_count(),
            fit.scm.mechanisms.len(),
            mean_r2
        );

        Ok(FittedSCM::new(
            graph.clone(),
            fit.scm.mechanisms,
            fit.scm.variable_types,
            fit.validation.r2_scores,
            mean_r2,
            warnings,
        ))
    }
}

fn join_ids(ids: &[&String]) -> String {
    ids.iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
