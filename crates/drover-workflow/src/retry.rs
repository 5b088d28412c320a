//! Bounded-attempt, fixed-delay retry around remote operations.
//!
//! An operation error counts as a failed attempt, not a hard failure; the
//! `accept` predicate decides whether an answer that did arrive is good
//! enough. Attempts run strictly one after another on the calling thread.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_secs(2),
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping `policy.delay`
/// between attempts. The first accepted result goes to `on_success`; if every
/// attempt fails, `on_failure` runs exactly once and its sentinel result is
/// returned.
pub fn execute_with_retry<T, R, E, Op, Accept, Success, Failure>(
    operation_name: &str,
    policy: RetryPolicy,
    mut op: Op,
    mut accept: Accept,
    on_success: Success,
    on_failure: Failure,
) -> R
where
    E: Display,
    Op: FnMut() -> Result<T, E>,
    Accept: FnMut(&T) -> bool,
    Success: FnOnce(T) -> R,
    Failure: FnOnce() -> R,
{
    for attempt in 1..=policy.max_attempts {
        tracing::info!(
            operation = operation_name,
            attempt,
            max_attempts = policy.max_attempts,
            "attempting operation"
        );

        match op() {
            Ok(result) if accept(&result) => {
                tracing::info!(operation = operation_name, attempt, "operation successful");
                return on_success(result);
            }
            Ok(_) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    "attempt rejected by success check"
                );
            }
            Err(error) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    %error,
                    "attempt failed"
                );
            }
        }

        if attempt < policy.max_attempts {
            tracing::info!(
                operation = operation_name,
                delay_ms = policy.delay.as_millis() as u64,
                "retrying after delay"
            );
            thread::sleep(policy.delay);
        } else {
            tracing::error!(operation = operation_name, "all attempts failed");
        }
    }

    on_failure()
}
