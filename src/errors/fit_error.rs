use super::BridgeError;

/// SCM fitting errors.
#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error("missing trace data for nodes: {}", .nodes.join(", "))]
    MissingTraceData { nodes: Vec<String> },

    #[error("fit quality below threshold: mean r2 {mean_r2:.3} < {threshold:.3}")]
    LowQualityFit { mean_r2: f64, threshold: f64 },

    #[error("incomplete fit payload: {reason}")]
    IncompletePayload { reason: String },

    #[error("fit unavailable: {0}")]
    Unavailable(#[from] BridgeError),
}

impl FitError {
    /// `MissingTraceData` is a caller error; everything else is an expected
    /// failure of the optional fitting feature.
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::MissingTraceData { .. })
    }
}
