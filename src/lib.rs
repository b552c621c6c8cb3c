//! # causal-bridge
//!
//! Turns a code-derived dependency graph into a fitted structural causal
//! model and answers "what happens if I intervene on X" queries by
//! orchestrating an external statistical engine across a process boundary.
//! The engine is slow, fragile, and optional: every failure mode short of a
//! caller programming error degrades to "feature unavailable" instead of
//! taking the caller down.
//!
//! ## Modules
//!
//! - `graph` — DAG construction and validation (`petgraph`)
//! - `protocol` — JSON wire contract with the engine
//! - `bridge` — one-shot subprocess transport + circuit breaker
//! - `fit` — SCM fitting with R² quality policy
//! - `intervention` — do-operator queries against a fitted model
//! - `facade` — lazy, cached, single-flight consumer API
//! - `config` / `errors` — shared configuration and the error taxonomy

pub mod bridge;
pub mod config;
pub mod errors;
pub mod facade;
pub mod fit;
pub mod graph;
pub mod intervention;
pub mod protocol;

pub use bridge::{BreakerState, CircuitBreaker, EngineTransport, ProcessBridge};
pub use config::{CausalConfig, EngineQuality};
pub use errors::{
    BridgeError, CausalError, CausalResult, FitError, GraphError, InterventionError,
};
pub use facade::CausalAnalysis;
pub use fit::{FittedSCM, SCMFitter, TraceData};
pub use graph::{CausalGraph, GraphBuilder};
pub use intervention::{
    Intervention, InterventionEngine, InterventionKind, InterventionResult, InterventionSpec,
    SoftTransform,
};
pub use protocol::{NodeStatistics, VariableType};
