//! Error types for every bridge subsystem, plus the umbrella `CausalError`.
//!
//! The taxonomy has four tiers: fatal caller errors surface as `Err` values,
//! expected environment failures degrade to absent results at the facade,
//! data-quality issues travel as `warnings` on populated results, and
//! informational events are log-only.

mod bridge_error;
mod fit_error;
mod graph_error;
mod intervention_error;

pub use bridge_error::BridgeError;
pub use fit_error::FitError;
pub use graph_error::GraphError;
pub use intervention_error::InterventionError;

/// Umbrella error for callers that do not care which layer failed.
#[derive(Debug, thiserror::Error)]
pub enum CausalError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("fit error: {0}")]
    Fit(#[from] FitError),

    #[error("intervention error: {0}")]
    Intervention(#[from] InterventionError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CausalResult<T> = Result<T, CausalError>;
