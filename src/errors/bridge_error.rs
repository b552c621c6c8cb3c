/// Bridge-layer errors: everything that can go wrong talking to the engine.
///
/// All variants except `Spawn` are expected failure modes returned as typed
/// values so callers are forced to handle them explicitly.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("engine not found at {path}: {guidance}")]
    EngineNotFound { path: String, guidance: String },

    #[error("engine call timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("engine crashed with exit code {exit_code}: {stderr}")]
    Crash { exit_code: i32, stderr: String },

    #[error("protocol violation: {reason}")]
    Protocol { reason: String },

    #[error("engine reported error: {message}")]
    EngineReported { message: String },

    #[error("circuit open: retry in {retry_in_secs}s")]
    CircuitOpen { retry_in_secs: u64 },

    #[error("engine spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
}
