//! Engine transport: the subprocess bridge and the circuit breaker that
//! guards it.

use std::time::Duration;

use crate::errors::BridgeError;
use crate::protocol::EngineRequest;

pub mod breaker;
pub mod process;

pub use breaker::{BreakerState, CircuitBreaker};
pub use process::ProcessBridge;

/// The seam between callers and the external engine.
///
/// One blocking request/response exchange per call, bounded by `timeout`.
/// Implementations return the decoded success envelope; every expected
/// failure mode is a typed [`BridgeError`], never a panic.
pub trait EngineTransport: Send + Sync {
    fn call(
        &self,
        request: &EngineRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value, BridgeError>;
}
