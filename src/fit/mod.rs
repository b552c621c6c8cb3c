//! SCM fitting: observation traces, the fitted model, and the fitter that
//! delegates the actual statistics to the external engine.

pub mod fitter;
pub mod scm;
pub mod traces;

pub use fitter::SCMFitter;
pub use scm::FittedSCM;
pub use traces::TraceData;
