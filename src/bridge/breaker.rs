//! Circuit breaker around an engine transport.
//!
//! Closed passes calls through and counts consecutive failures; after
//! `failure_threshold` failures the breaker opens and short-circuits every
//! call until the cooldown elapses, at which point a single half-open probe
//! decides between closing again and re-opening. Keeps a known-dead engine
//! from turning every caller into a slow timeout.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::CausalConfig;
use crate::errors::BridgeError;
use crate::protocol::EngineRequest;

use super::EngineTransport;

/// Externally observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    last_failure: Option<Instant>,
    probe_in_flight: bool,
}

/// Wraps any [`EngineTransport`] with the breaker state machine.
///
/// Explicitly owned and injectable, never a singleton; the mutex guards
/// state transitions only, never the underlying call.
pub struct CircuitBreaker {
    inner: Arc<dyn EngineTransport>,
    failure_threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(inner: Arc<dyn EngineTransport>, config: &CausalConfig) -> Self {
        Self {
            inner,
            failure_threshold: config.failure_threshold.max(1),
            cooldown: config.cooldown_period(),
            state: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decide whether a call may proceed, advancing Open → HalfOpen when the
    /// cooldown has elapsed. HalfOpen admits exactly one probe.
    fn admit(&self) -> Result<(), BridgeError> {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    Err(BridgeError::CircuitOpen { retry_in_secs: 0 })
                } else {
                    inner.probe_in_flight = true;
                    Ok(())
                }
            }
            BreakerState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|t| t.elapsed())
                    .unwrap_or(self.cooldown);
                if elapsed >= self.cooldown {
                    inner.state = BreakerState::HalfOpen;
                    inner.probe_in_flight = true;
                    info!("circuit breaker: open -> half-open (cooldown elapsed)");
                    Ok(())
                } else {
                    let remaining = self.cooldown - elapsed;
                    Err(BridgeError::CircuitOpen {
                        retry_in_secs: remaining.as_secs(),
                    })
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::Closed {
            info!("circuit breaker: {:?} -> closed", inner.state);
        }
        inner.state = BreakerState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
        inner.probe_in_flight = false;
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.last_failure = Some(Instant::now());
                inner.probe_in_flight = false;
                info!("circuit breaker: half-open -> open (probe failed)");
            }
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.last_failure = Some(Instant::now());
                    info!(
                        "circuit breaker: closed -> open after {} consecutive failures",
                        inner.failure_count
                    );
                }
            }
            BreakerState::Open => {
                // A call admitted before the trip finished late; refresh the
                // cooldown window.
                inner.last_failure = Some(Instant::now());
            }
        }
    }
}

impl EngineTransport for CircuitBreaker {
    fn call(
        &self,
        request: &EngineRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value, BridgeError> {
        self.admit()?;
        match self.inner.call(request, timeout) {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }
}
