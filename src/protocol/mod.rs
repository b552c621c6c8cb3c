//! Wire protocol: the JSON request/response contract with the external
//! statistical engine. One UTF-8 document each way per call, exchanged over
//! the child process's stdin/stdout. All "this library might change its API"
//! risk lives here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{CausalConfig, EngineQuality};
use crate::errors::BridgeError;

/// The operation a request asks the engine to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Fit,
    Intervene,
}

/// Graph section of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

/// Engine tuning section of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigPayload {
    pub quality: EngineQuality,
    pub validate_r2: bool,
    pub r2_threshold: f64,
}

impl From<&CausalConfig> for EngineConfigPayload {
    fn from(config: &CausalConfig) -> Self {
        Self {
            quality: config.quality,
            validate_r2: config.validate_r2,
            r2_threshold: config.r2_threshold,
        }
    }
}

/// A single intervention on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterventionOp {
    Hard {
        node: String,
        value: f64,
    },
    Soft {
        node: String,
        transform: SoftTransformOp,
        param: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftTransformOp {
    Shift,
    Scale,
}

/// Intervention section of a request. An empty `interventions` list is an
/// observational query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionPayload {
    pub interventions: Vec<InterventionOp>,
    pub query_nodes: Option<Vec<String>>,
    pub num_samples: usize,
}

/// The full request document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRequest {
    pub graph: GraphPayload,
    pub traces: Option<HashMap<String, Vec<f64>>>,
    pub operation: Operation,
    pub intervention: Option<InterventionPayload>,
    pub config: EngineConfigPayload,
}

/// Per-variable type metadata the engine may report alongside a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Continuous,
    Binary,
    Categorical,
}

/// `scm` section of a fit response.
#[derive(Debug, Clone, Deserialize)]
pub struct ScmPayload {
    /// Opaque fitted-mechanism descriptor per node. Never constructed
    /// locally.
    pub mechanisms: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub variable_types: HashMap<String, VariableType>,
}

/// `validation` section of a fit response.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationPayload {
    pub r2_scores: HashMap<String, f64>,
    pub mean_r2: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Decoded fit response.
#[derive(Debug, Clone, Deserialize)]
pub struct FitPayload {
    pub scm: ScmPayload,
    pub validation: ValidationPayload,
}

/// Summary statistics for one node's post-intervention distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// `metadata` section of an intervene response. Engines may omit fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataPayload {
    #[serde(default)]
    pub num_samples: Option<usize>,
    #[serde(default)]
    pub query_time_ms: Option<u64>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Decoded intervene response.
#[derive(Debug, Clone, Deserialize)]
pub struct InterventionResponsePayload {
    pub statistics: HashMap<String, NodeStatistics>,
    pub metadata: MetadataPayload,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Encode a request to a single JSON document.
pub fn encode_request(request: &EngineRequest) -> Result<String, BridgeError> {
    serde_json::to_string(request).map_err(|e| BridgeError::Protocol {
        reason: format!("request encoding failed: {e}"),
    })
}

/// Decode the response envelope: parse JSON, require a `status` field, and
/// split success payloads from engine-reported errors.
pub fn decode_envelope(raw: &str) -> Result<serde_json::Value, BridgeError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| BridgeError::Protocol {
        reason: format!("response is not valid JSON: {e}"),
    })?;
    let status = value
        .get("status")
        .and_then(|s| s.as_str())
        .ok_or_else(|| BridgeError::Protocol {
            reason: "response missing status field".into(),
        })?;
    match status {
        "success" => Ok(value),
        "error" => {
            let message = value
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unspecified engine error")
                .to_string();
            if let Some(traceback) = value.get("traceback").and_then(|t| t.as_str()) {
                tracing::debug!("engine traceback: {traceback}");
            }
            Err(BridgeError::EngineReported { message })
        }
        other => Err(BridgeError::Protocol {
            reason: format!("unexpected status {other:?}"),
        }),
    }
}

/// Extract the typed fit payload from a success envelope.
pub fn decode_fit(value: &serde_json::Value) -> Result<FitPayload, BridgeError> {
    serde_json::from_value(value.clone()).map_err(|e| BridgeError::Protocol {
        reason: format!("fit payload missing required fields: {e}"),
    })
}

/// Extract the typed intervene payload from a success envelope.
pub fn decode_intervene(
    value: &serde_json::Value,
) -> Result<InterventionResponsePayload, BridgeError> {
    serde_json::from_value(value.clone()).map_err(|e| BridgeError::Protocol {
        reason: format!("intervene payload missing required fields: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EngineRequest {
        EngineRequest {
            graph: GraphPayload {
                nodes: vec!["x".into(), "y".into()],
                edges: vec![("x".into(), "y".into())],
            },
            traces: None,
            operation: Operation::Fit,
            intervention: None,
            config: EngineConfigPayload {
                quality: EngineQuality::Good,
                validate_r2: false,
                r2_threshold: 0.5,
            },
        }
    }

    #[test]
    fn request_encodes_wire_shape() {
        let encoded = encode_request(&request()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["operation"], "fit");
        assert_eq!(value["graph"]["edges"][0][0], "x");
        assert_eq!(value["graph"]["edges"][0][1], "y");
        assert_eq!(value["config"]["quality"], "GOOD");
        assert!(value["traces"].is_null());
        assert!(value["intervention"].is_null());
    }

    #[test]
    fn envelope_rejects_invalid_json() {
        let err = decode_envelope("not json at all").unwrap_err();
        assert!(matches!(err, BridgeError::Protocol { .. }));
    }

    #[test]
    fn envelope_requires_status() {
        let err = decode_envelope(r#"{"scm": {}}"#).unwrap_err();
        assert!(matches!(err, BridgeError::Protocol { .. }));
    }

    #[test]
    fn envelope_surfaces_engine_error() {
        let err = decode_envelope(
            r#"{"status": "error", "error": "singular matrix", "traceback": "..."}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::EngineReported { message } if message == "singular matrix"
        ));
    }

    #[test]
    fn fit_payload_requires_validation_section() {
        let envelope =
            decode_envelope(r#"{"status": "success", "scm": {"mechanisms": {}}}"#).unwrap();
        let err = decode_fit(&envelope).unwrap_err();
        assert!(matches!(err, BridgeError::Protocol { .. }));
    }

    #[test]
    fn fit_payload_decodes() {
        let raw = r#"{
            "status": "success",
            "scm": {"mechanisms": {"y": {"kind": "linear"}}, "variable_types": {"y": "continuous"}},
            "validation": {"r2_scores": {"y": 0.9}, "mean_r2": 0.9}
        }"#;
        let envelope = decode_envelope(raw).unwrap();
        let fit = decode_fit(&envelope).unwrap();
        assert_eq!(fit.validation.r2_scores["y"], 0.9);
        assert_eq!(fit.scm.variable_types["y"], VariableType::Continuous);
    }

    #[test]
    fn intervention_op_serializes_tagged() {
        let op = InterventionOp::Soft {
            node: "x".into(),
            transform: SoftTransformOp::Scale,
            param: 2.0,
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "soft");
        assert_eq!(value["transform"], "scale");
    }
}
