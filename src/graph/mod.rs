//! Causal graph: immutable DAG over string-identified variables, with a
//! validating builder that rejects cycles before any engine call.

pub mod builder;
pub mod causal_graph;

pub use builder::GraphBuilder;
pub use causal_graph::CausalGraph;
