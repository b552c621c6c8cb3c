//! CausalAnalysis: the lazy, cached, single-flight consumer API.
//!
//! The enclosing representation hands this facade a node/edge list and
//! optional traces; everything else is on-demand. Expected failures surface
//! as absent results with a warning log: the causal feature is optional and
//! must never take the caller down.

use std::sync::{Arc, OnceLock};

use moka::sync::Cache;
use tracing::{error, info, warn};

use crate::bridge::{BreakerState, CircuitBreaker, EngineTransport, ProcessBridge};
use crate::config::CausalConfig;
use crate::errors::{FitError, GraphError, InterventionError};
use crate::fit::{FittedSCM, SCMFitter, TraceData};
use crate::graph::{CausalGraph, GraphBuilder};
use crate::intervention::{InterventionEngine, InterventionResult, InterventionSpec};

/// Lazy causal analysis over one node/edge list.
///
/// Graph construction runs once per facade; model fitting runs once per
/// (graph, data) content hash with single-flight deduplication, so
/// concurrent callers for the same key await one engine call instead of
/// spawning duplicate subprocesses. Failed fits are cached as absent for the
/// facade's lifetime; there is no automatic retry.
pub struct CausalAnalysis {
    node_ids: Vec<String>,
    edge_list: Vec<(String, String)>,
    traces: Option<TraceData>,
    config: CausalConfig,
    transport: Arc<CircuitBreaker>,
    graph_cell: OnceLock<Option<Arc<CausalGraph>>>,
    model_cache: Cache<String, Option<Arc<FittedSCM>>>,
}

impl CausalAnalysis {
    /// Construct with the default subprocess transport.
    pub fn new(
        nodes: Vec<String>,
        edges: Vec<(String, String)>,
        traces: Option<TraceData>,
        config: CausalConfig,
    ) -> Self {
        let bridge: Arc<dyn EngineTransport> = Arc::new(ProcessBridge::new(&config));
        Self::with_transport(nodes, edges, traces, config, bridge)
    }

    /// Construct with a custom transport (tests, alternative engines).
    pub fn with_transport(
        nodes: Vec<String>,
        edges: Vec<(String, String)>,
        traces: Option<TraceData>,
        config: CausalConfig,
        transport: Arc<dyn EngineTransport>,
    ) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(transport, &config));
        let model_cache = Cache::builder()
            .max_capacity(config.model_cache_size.max(1))
            .build();
        Self {
            node_ids: nodes,
            edge_list: edges,
            traces,
            config,
            transport: breaker,
            graph_cell: OnceLock::new(),
            model_cache,
        }
    }

    pub fn config(&self) -> &CausalConfig {
        &self.config
    }

    /// Current breaker state, for health reporting.
    pub fn breaker_state(&self) -> BreakerState {
        self.transport.state()
    }

    /// The validated causal graph, or `None` when the input cannot form one
    /// (empty, cyclic, oversized). Built once, pure, no subprocess.
    pub fn causal_graph(&self) -> Option<Arc<CausalGraph>> {
        self.graph_cell
            .get_or_init(|| {
                let builder = GraphBuilder::with_max_nodes(self.config.max_nodes);
                match builder.build(self.node_ids.clone(), self.edge_list.clone()) {
                    Ok(graph) => {
                        info!(
                            "causal graph built: {} nodes, {} edges",
                            graph.node_count(),
                            graph.edge_count()
                        );
                        Some(Arc::new(graph))
                    }
                    Err(e) if e.is_expected() => {
                        warn!("causal graph unavailable: {e}");
                        None
                    }
                    Err(e) => {
                        error!("causal graph rejected: {e}");
                        None
                    }
                }
            })
            .clone()
    }

    /// The fitted SCM, or `None` when fitting is unavailable. Lazy, cached,
    /// single-flight.
    pub fn causal_model(&self) -> Option<Arc<FittedSCM>> {
        let graph = self.causal_graph()?;
        let data_fingerprint = self.traces.as_ref().map(TraceData::fingerprint);
        let key = graph.content_hash(data_fingerprint.as_deref());

        if self.model_cache.contains_key(&key) {
            tracing::debug!("causal model cache hit");
        }
        self.model_cache.get_with(key, || {
            let fitter = SCMFitter::new(self.transport.clone(), self.config.clone());
            match fitter.fit(&graph, self.traces.as_ref()) {
                Ok(scm) => Some(Arc::new(scm)),
                Err(e @ FitError::MissingTraceData { .. }) => {
                    error!("causal model rejected: {e}");
                    None
                }
                Err(e) => {
                    warn!("causal model unavailable: {e}");
                    None
                }
            }
        })
    }

    /// Names of nodes causally downstream of `target`, in node order.
    /// `Ok(None)` when the graph is unavailable; `Err` for an unknown
    /// target, which is a caller error.
    pub fn causal_impact(&self, target: &str) -> Result<Option<Vec<String>>, GraphError> {
        let Some(graph) = self.causal_graph() else {
            return Ok(None);
        };
        match graph.descendants_of(target) {
            Some(descendants) => Ok(Some(descendants)),
            None => Err(GraphError::UnknownNode {
                node: target.to_string(),
            }),
        }
    }

    /// Run an intervention query. `Ok(None)` when the model or engine is
    /// unavailable; `Err` only for caller errors (unknown node, bad value,
    /// zero samples).
    pub fn causal_intervention(
        &self,
        spec: &InterventionSpec,
    ) -> Result<Option<InterventionResult>, InterventionError> {
        let Some(scm) = self.causal_model() else {
            return Ok(None);
        };
        let engine = InterventionEngine::new(self.transport.clone(), self.config.clone());
        match engine.intervene(&scm, spec) {
            Ok(result) => Ok(Some(result)),
            Err(e) if e.is_expected() => {
                warn!("causal intervention unavailable: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
