//! InterventionEngine tests: fail-fast validation with spy transports, the
//! do-operator scenario, and payload completeness checks.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use causal_bridge::bridge::EngineTransport;
use causal_bridge::config::CausalConfig;
use causal_bridge::errors::{BridgeError, InterventionError};
use causal_bridge::fit::{FittedSCM, SCMFitter};
use causal_bridge::graph::GraphBuilder;
use causal_bridge::intervention::{
    Intervention, InterventionEngine, InterventionSpec, SoftTransform,
};
use causal_bridge::protocol::{EngineRequest, Operation};

/// Spy transport: answers fit and intervene requests from fixtures and
/// records every call.
struct SpyTransport {
    fit_envelope: serde_json::Value,
    intervene_envelope: Result<serde_json::Value, fn() -> BridgeError>,
    intervene_calls: AtomicU32,
    last_intervention: std::sync::Mutex<Option<serde_json::Value>>,
}

impl SpyTransport {
    fn new(fit_envelope: serde_json::Value, intervene_envelope: serde_json::Value) -> Self {
        Self {
            fit_envelope,
            intervene_envelope: Ok(intervene_envelope),
            intervene_calls: AtomicU32::new(0),
            last_intervention: std::sync::Mutex::new(None),
        }
    }

    fn failing_intervene(fit_envelope: serde_json::Value, make: fn() -> BridgeError) -> Self {
        Self {
            fit_envelope,
            intervene_envelope: Err(make),
            intervene_calls: AtomicU32::new(0),
            last_intervention: std::sync::Mutex::new(None),
        }
    }

    fn intervene_count(&self) -> u32 {
        self.intervene_calls.load(Ordering::SeqCst)
    }

    fn last_intervention(&self) -> Option<serde_json::Value> {
        self.last_intervention.lock().unwrap().clone()
    }
}

impl EngineTransport for SpyTransport {
    fn call(
        &self,
        request: &EngineRequest,
        _timeout: Duration,
    ) -> Result<serde_json::Value, BridgeError> {
        match request.operation {
            Operation::Fit => Ok(self.fit_envelope.clone()),
            Operation::Intervene => {
                self.intervene_calls.fetch_add(1, Ordering::SeqCst);
                *self.last_intervention.lock().unwrap() =
                    Some(serde_json::to_value(&request.intervention).unwrap());
                match &self.intervene_envelope {
                    Ok(value) => Ok(value.clone()),
                    Err(make) => Err(make()),
                }
            }
        }
    }
}

fn chain_fit_envelope() -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "scm": {
            "mechanisms": {"y": {"kind": "linear", "coef": [2.0]}},
            "variable_types": {"x": "continuous", "y": "continuous"}
        },
        "validation": {"r2_scores": {"y": 0.95}, "mean_r2": 0.95}
    })
}

fn chain_intervene_envelope() -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "statistics": {
            "x": {"mean": 5.0, "std": 0.0, "min": 5.0, "max": 5.0},
            "y": {"mean": 10.0, "std": 0.4, "min": 8.7, "max": 11.2}
        },
        "metadata": {"num_samples": 1000, "query_time_ms": 42}
    })
}

/// Fit a two-node chain x -> y through the spy so intervention tests have a
/// real FittedSCM.
fn fitted_chain(transport: &Arc<SpyTransport>) -> FittedSCM {
    let graph = Arc::new(
        GraphBuilder::new()
            .build(
                vec!["x".into(), "y".into()],
                vec![("x".into(), "y".into())],
            )
            .unwrap(),
    );
    let fitter = SCMFitter::new(transport.clone() as Arc<dyn EngineTransport>, CausalConfig::default());
    fitter.fit(&graph, None).unwrap()
}

fn engine(transport: &Arc<SpyTransport>) -> InterventionEngine {
    InterventionEngine::new(
        transport.clone() as Arc<dyn EngineTransport>,
        CausalConfig::default(),
    )
}

// =============================================================================
// Fail-fast validation: no subprocess for caller errors
// =============================================================================

#[test]
fn unknown_target_fails_before_any_engine_call() {
    let transport = Arc::new(SpyTransport::new(
        chain_fit_envelope(),
        chain_intervene_envelope(),
    ));
    let scm = fitted_chain(&transport);

    let err = engine(&transport)
        .intervene(&scm, &InterventionSpec::hard("ghost", 1.0))
        .unwrap_err();
    assert!(matches!(err, InterventionError::UnknownNode { node } if node == "ghost"));
    assert_eq!(transport.intervene_count(), 0);
}

#[test]
fn unknown_query_node_fails_fast_too() {
    let transport = Arc::new(SpyTransport::new(
        chain_fit_envelope(),
        chain_intervene_envelope(),
    ));
    let scm = fitted_chain(&transport);

    let spec = InterventionSpec::hard("x", 1.0).with_query_nodes(["ghost".to_string()]);
    let err = engine(&transport).intervene(&scm, &spec).unwrap_err();
    assert!(matches!(err, InterventionError::UnknownNode { .. }));
    assert_eq!(transport.intervene_count(), 0);
}

#[test]
fn zero_samples_is_rejected() {
    let transport = Arc::new(SpyTransport::new(
        chain_fit_envelope(),
        chain_intervene_envelope(),
    ));
    let scm = fitted_chain(&transport);

    let spec = InterventionSpec::observational().with_num_samples(0);
    let err = engine(&transport).intervene(&scm, &spec).unwrap_err();
    assert!(matches!(err, InterventionError::InvalidSamples));
    assert_eq!(transport.intervene_count(), 0);
}

#[test]
fn binary_node_rejects_non_binary_hard_value() {
    let fit = serde_json::json!({
        "status": "success",
        "scm": {
            "mechanisms": {"y": {}},
            "variable_types": {"x": "binary", "y": "continuous"}
        },
        "validation": {"r2_scores": {"y": 0.9}, "mean_r2": 0.9}
    });
    let transport = Arc::new(SpyTransport::new(fit, chain_intervene_envelope()));
    let scm = fitted_chain(&transport);

    let err = engine(&transport)
        .intervene(&scm, &InterventionSpec::hard("x", 0.5))
        .unwrap_err();
    assert!(matches!(err, InterventionError::TypeMismatch { node, .. } if node == "x"));
    assert_eq!(transport.intervene_count(), 0);

    // 0.0 and 1.0 are fine for a binary node.
    engine(&transport)
        .intervene(&scm, &InterventionSpec::hard("x", 1.0))
        .unwrap();
}

#[test]
fn soft_transform_on_binary_node_is_a_type_mismatch() {
    let fit = serde_json::json!({
        "status": "success",
        "scm": {
            "mechanisms": {"y": {}},
            "variable_types": {"x": "binary", "y": "continuous"}
        },
        "validation": {"r2_scores": {"y": 0.9}, "mean_r2": 0.9}
    });
    let transport = Arc::new(SpyTransport::new(fit, chain_intervene_envelope()));
    let scm = fitted_chain(&transport);

    let err = engine(&transport)
        .intervene(
            &scm,
            &InterventionSpec::soft("x", SoftTransform::Shift, 1.0),
        )
        .unwrap_err();
    assert!(matches!(err, InterventionError::TypeMismatch { .. }));
}

// =============================================================================
// do-operator scenario: do(x := 5) on x -> y where y = 2x
// =============================================================================

#[test]
fn hard_intervention_surfaces_engine_statistics() {
    let transport = Arc::new(SpyTransport::new(
        chain_fit_envelope(),
        chain_intervene_envelope(),
    ));
    let scm = fitted_chain(&transport);

    let result = engine(&transport)
        .intervene(&scm, &InterventionSpec::hard("x", 5.0))
        .unwrap();

    assert_eq!(result.statistics["y"].mean, 10.0);
    assert_eq!(result.metadata.num_samples, 1000);
    assert_eq!(result.metadata.query_time_ms, 42);
    assert_eq!(
        result.metadata.interventions_applied,
        vec!["do(x := 5)".to_string()]
    );

    // The wire payload carried the do-operation.
    let sent = transport.last_intervention().unwrap();
    assert_eq!(sent["interventions"][0]["type"], "hard");
    assert_eq!(sent["interventions"][0]["node"], "x");
    assert_eq!(sent["interventions"][0]["value"], 5.0);
}

#[test]
fn multiple_interventions_apply_simultaneously() {
    let transport = Arc::new(SpyTransport::new(
        chain_fit_envelope(),
        chain_intervene_envelope(),
    ));
    let scm = fitted_chain(&transport);

    let spec = InterventionSpec::multiple(vec![
        Intervention::Hard {
            node: "x".into(),
            value: 5.0,
        },
        Intervention::Soft {
            node: "y".into(),
            transform: SoftTransform::Scale,
            param: 1.5,
        },
    ]);
    let result = engine(&transport).intervene(&scm, &spec).unwrap();
    assert_eq!(result.metadata.interventions_applied.len(), 2);

    let sent = transport.last_intervention().unwrap();
    assert_eq!(sent["interventions"].as_array().unwrap().len(), 2);
    assert_eq!(sent["interventions"][1]["transform"], "scale");
}

#[test]
fn observational_query_sends_no_interventions() {
    let transport = Arc::new(SpyTransport::new(
        chain_fit_envelope(),
        chain_intervene_envelope(),
    ));
    let scm = fitted_chain(&transport);

    engine(&transport)
        .intervene(&scm, &InterventionSpec::observational())
        .unwrap();
    let sent = transport.last_intervention().unwrap();
    assert_eq!(sent["interventions"].as_array().unwrap().len(), 0);
    assert_eq!(sent["num_samples"], 1000);
}

// =============================================================================
// Payload completeness and bridge failures
// =============================================================================

#[test]
fn missing_query_node_statistics_is_incomplete() {
    let partial = serde_json::json!({
        "status": "success",
        "statistics": {
            "x": {"mean": 5.0, "std": 0.0, "min": 5.0, "max": 5.0}
        },
        "metadata": {}
    });
    let transport = Arc::new(SpyTransport::new(chain_fit_envelope(), partial));
    let scm = fitted_chain(&transport);

    let err = engine(&transport)
        .intervene(&scm, &InterventionSpec::hard("x", 5.0))
        .unwrap_err();
    let InterventionError::IncompletePayload { missing } = err else {
        panic!("expected IncompletePayload, got {err:?}");
    };
    assert_eq!(missing, vec!["y".to_string()]);
}

#[test]
fn query_nodes_restrict_the_completeness_check() {
    let partial = serde_json::json!({
        "status": "success",
        "statistics": {
            "y": {"mean": 10.0, "std": 0.4, "min": 8.7, "max": 11.2}
        },
        "metadata": {}
    });
    let transport = Arc::new(SpyTransport::new(chain_fit_envelope(), partial));
    let scm = fitted_chain(&transport);

    let spec = InterventionSpec::hard("x", 5.0).with_query_nodes(["y".to_string()]);
    let result = engine(&transport).intervene(&scm, &spec).unwrap();
    assert_eq!(result.statistics.len(), 1);
}

#[test]
fn bridge_failure_maps_to_unavailable() {
    let transport = Arc::new(SpyTransport::failing_intervene(chain_fit_envelope(), || {
        BridgeError::Crash {
            exit_code: 1,
            stderr: "RuntimeError: numerical instability".into(),
        }
    }));
    let scm = fitted_chain(&transport);

    let err = engine(&transport)
        .intervene(&scm, &InterventionSpec::hard("x", 5.0))
        .unwrap_err();
    assert!(matches!(
        err,
        InterventionError::Unavailable(BridgeError::Crash { .. })
    ));
    assert!(err.is_expected());
}
