// Single source of truth for all default values.

// --- Engine ---
pub const DEFAULT_ENGINE_PATH: &str = "causal-engine";
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_STDERR_LEN: usize = 4_096;

// --- Circuit breaker ---
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

// --- Graph ---
pub const DEFAULT_MAX_NODES: usize = 10_000;

// --- Fitting ---
pub const DEFAULT_MIN_SAMPLES: usize = 100;
pub const DEFAULT_R2_WARNING_THRESHOLD: f64 = 0.7;
pub const DEFAULT_R2_THRESHOLD: f64 = 0.5;
pub const DEFAULT_VALIDATE_R2: bool = false;
pub const DEFAULT_NEAR_CONSTANT_EPSILON: f64 = 1e-9;

// --- Intervention ---
pub const DEFAULT_NUM_SAMPLES: usize = 1_000;

// --- Facade ---
pub const DEFAULT_MODEL_CACHE_SIZE: u64 = 64;
