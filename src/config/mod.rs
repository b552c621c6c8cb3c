//! Causal-bridge configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod defaults;

/// Engine speed/accuracy tradeoff, passed through on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineQuality {
    Good,
    Better,
    Best,
}

impl Default for EngineQuality {
    fn default() -> Self {
        Self::Good
    }
}

/// Configuration for the whole bridge stack: engine invocation, circuit
/// breaker, graph limits, and fit-quality policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalConfig {
    /// Path to the external engine executable.
    pub engine_path: PathBuf,
    /// Extra arguments passed to the engine process.
    pub engine_args: Vec<String>,
    /// Engine speed/accuracy tradeoff.
    pub quality: EngineQuality,
    /// Per-call timeout in seconds.
    pub call_timeout_secs: u64,
    /// Consecutive failures before the breaker trips open.
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before admitting a probe call.
    pub cooldown_secs: u64,
    /// Treat a fit below `r2_threshold` as failed instead of degraded.
    pub validate_r2: bool,
    /// Mean R² below which a validated fit is rejected.
    pub r2_threshold: f64,
    /// Mean R² below which a fit carries a quality warning.
    pub r2_warning_threshold: f64,
    /// Maximum node count accepted by the graph builder.
    pub max_nodes: usize,
    /// Trace rows below which a fit carries an insufficient-samples warning.
    pub min_samples: usize,
    /// Maximum captured stderr length on engine crash.
    pub max_stderr_len: usize,
    /// Capacity of the per-facade fitted-model cache.
    pub model_cache_size: u64,
}

impl Default for CausalConfig {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from(defaults::DEFAULT_ENGINE_PATH),
            engine_args: Vec::new(),
            quality: EngineQuality::default(),
            call_timeout_secs: defaults::DEFAULT_CALL_TIMEOUT_SECS,
            failure_threshold: defaults::DEFAULT_FAILURE_THRESHOLD,
            cooldown_secs: defaults::DEFAULT_COOLDOWN_SECS,
            validate_r2: defaults::DEFAULT_VALIDATE_R2,
            r2_threshold: defaults::DEFAULT_R2_THRESHOLD,
            r2_warning_threshold: defaults::DEFAULT_R2_WARNING_THRESHOLD,
            max_nodes: defaults::DEFAULT_MAX_NODES,
            min_samples: defaults::DEFAULT_MIN_SAMPLES,
            max_stderr_len: defaults::DEFAULT_MAX_STDERR_LEN,
            model_cache_size: defaults::DEFAULT_MODEL_CACHE_SIZE,
        }
    }
}

impl CausalConfig {
    /// Per-call timeout as a `Duration`.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Breaker cooldown as a `Duration`.
    pub fn cooldown_period(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
