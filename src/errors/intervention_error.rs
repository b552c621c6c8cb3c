use super::BridgeError;

/// Intervention query errors.
#[derive(Debug, thiserror::Error)]
pub enum InterventionError {
    #[error("unknown node: {node}")]
    UnknownNode { node: String },

    #[error("type mismatch for {node}: expected {expected}, got {actual}")]
    TypeMismatch {
        node: String,
        expected: String,
        actual: String,
    },

    #[error("num_samples must be positive")]
    InvalidSamples,

    #[error("incomplete intervention payload: missing statistics for {}", .missing.join(", "))]
    IncompletePayload { missing: Vec<String> },

    #[error("intervention unavailable: {0}")]
    Unavailable(#[from] BridgeError),
}

impl InterventionError {
    /// Malformed caller input (unknown node, bad value, zero samples) is
    /// fatal; engine-side failures degrade to "feature unavailable".
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::IncompletePayload { .. })
    }
}
