//! Interventional queries: the consumer-facing specification sum type and
//! the engine that executes do-operator queries against a fitted SCM.

pub mod engine;
pub mod spec;

pub use engine::{InterventionEngine, InterventionMetadata, InterventionResult};
pub use spec::{Intervention, InterventionKind, InterventionSpec, SoftTransform};
