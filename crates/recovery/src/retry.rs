// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry with bounded exponential backoff and symmetric jitter.

use std::future::Future;
use std::time::Duration;
use swarm_core::RetryConfig;

/// Backoff delay before retry attempt `attempt` (0-based: the delay taken
/// after the first failure is attempt 0).
///
/// `jitter_roll` is a uniform sample in [-1, 1]; the final delay is the
/// exponential delay scaled by `1 + jitter * roll`, clamped so it can
/// never go negative or exceed the configured maximum.
pub fn delay_for_attempt(config: &RetryConfig, attempt: u32, jitter_roll: f64) -> Duration {
    let base = config.initial_delay_ms as f64 * config.multiplier.powi(attempt as i32);
    let capped = base.min(config.max_delay_ms as f64);
    let jitter = config.jitter.clamp(0.0, 1.0) * jitter_roll.clamp(-1.0, 1.0);
    let jittered = (capped * (1.0 + jitter)).max(0.0);
    Duration::from_millis(jittered.min(config.max_delay_ms as f64) as u64)
}

/// Run `operation` up to `max_retries + 1` times.
///
/// With `max_retries = 0` the operation executes exactly once. The
/// callback receives the 1-based attempt number. The last error is
/// returned when every attempt fails.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: &RetryConfig,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = config.max_retries + 1;
    let mut last_err = None;
    for attempt in 1..=attempts {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt < attempts {
                    let roll = {
                        use rand::Rng;
                        rand::rng().random_range(-1.0..=1.0)
                    };
                    let delay = delay_for_attempt(config, attempt - 1, roll);
                    tracing::warn!(
                        what,
                        attempt,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    tracing::error!(what, attempts, error = %err, "all attempts failed");
                }
                last_err = Some(err);
            }
        }
    }
    // attempts >= 1, so an error is always recorded on this path
    match last_err {
        Some(err) => Err(err),
        None => unreachable!("retry loop runs at least once"),
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
