// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-state circuit breaker for external integrations.
//!
//! closed → open after `failure_threshold` consecutive failures;
//! open → half-open once `open_timeout` elapses; half-open → closed after
//! `success_threshold` consecutive successes, or straight back to open on
//! any failure. State checks and updates share one lock, so a success and
//! a failure racing in half-open resolve in arrival order: the failure
//! reverts to open and later successes count from zero.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use swarm_core::{BreakerConfig, Clock, ErrorCode, SwarmError};

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<DateTime<Utc>>,
}

/// A named circuit breaker.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<BreakerInner>>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            config,
            clock,
            inner: Arc::new(Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
            })),
        }
    }

    /// Current state, after applying any due open → half-open move.
    pub fn state(&self) -> BreakerState {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner);
        inner.state
    }

    /// Gate a call: `Ok` when requests may proceed, `CIRCUIT_OPEN`
    /// otherwise. A `open_timeout` of zero half-opens immediately.
    pub fn check(&self) -> Result<(), SwarmError> {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner);
        match inner.state {
            BreakerState::Open => Err(SwarmError::new(
                ErrorCode::CircuitOpen,
                self.name,
                format!("circuit breaker {} is open", self.name),
            )),
            _ => Ok(()),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner);
        match inner.state {
            BreakerState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.success_threshold {
                    tracing::info!(breaker = self.name, "circuit closed");
                    inner.state = BreakerState::Closed;
                    inner.consecutive_failures = 0;
                    inner.half_open_successes = 0;
                    inner.opened_at = None;
                }
            }
            BreakerState::Closed => {
                inner.consecutive_failures = 0;
            }
            BreakerState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner);
        match inner.state {
            BreakerState::HalfOpen => {
                // A failure during probing loses the race: back to open
                tracing::warn!(breaker = self.name, "probe failed, reopening circuit");
                self.trip(&mut inner);
            }
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    tracing::warn!(
                        breaker = self.name,
                        failures = inner.consecutive_failures,
                        "circuit opened"
                    );
                    self.trip(&mut inner);
                }
            }
            BreakerState::Open => {}
        }
    }

    /// Gate and record one call.
    pub async fn call<T, E, Fut>(&self, operation: Fut) -> Result<Result<T, E>, SwarmError>
    where
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.check()?;
        let result = operation.await;
        match &result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
        Ok(result)
    }

    fn trip(&self, inner: &mut BreakerInner) {
        inner.state = BreakerState::Open;
        inner.half_open_successes = 0;
        inner.opened_at = Some(self.clock.now());
    }

    fn maybe_half_open(&self, inner: &mut BreakerInner) {
        if inner.state != BreakerState::Open {
            return;
        }
        let Some(opened_at) = inner.opened_at else {
            return;
        };
        let elapsed = self.clock.now().signed_duration_since(opened_at);
        let timeout = chrono::Duration::milliseconds(self.config.open_timeout_ms as i64);
        if elapsed >= timeout {
            tracing::info!(breaker = self.name, "circuit half-open, probing");
            inner.state = BreakerState::HalfOpen;
            inner.half_open_successes = 0;
        }
    }
}

/// The breakers protecting each external integration.
#[derive(Clone)]
pub struct Breakers {
    pub database: CircuitBreaker,
    pub panes: CircuitBreaker,
    pub worktrees: CircuitBreaker,
}

impl Breakers {
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            database: CircuitBreaker::new("database", config, clock.clone()),
            panes: CircuitBreaker::new("panes", config, clock.clone()),
            worktrees: CircuitBreaker::new("worktrees", config, clock),
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
