//! Retry loop: run attempts until one succeeds or the policy says stop.

use std::time::Duration;

use super::classify::Outcome;
use super::error::ExecuteError;
use super::policy::RetryPolicy;
use crate::client::{Response, Sleeper};
use crate::control::CancelToken;

/// Runs `attempt_fn` (given the 1-based attempt number) until it yields a
/// success or a terminal failure. On a retry outcome, sleeps for the chosen
/// wait then tries again. The attempt counter is bounded by the classifier,
/// which never asks for a retry once `policy.max_attempts()` is reached.
pub(crate) fn run_with_retry<S, F>(
    policy: &RetryPolicy,
    sleeper: &S,
    cancel: &CancelToken,
    mut attempt_fn: F,
) -> Result<Response, ExecuteError>
where
    S: Sleeper + ?Sized,
    F: FnMut(u32) -> Outcome,
{
    let mut attempt = 1u32;
    loop {
        if cancel.is_cancelled() {
            tracing::debug!("cancelled before attempt {}", attempt);
            return Err(ExecuteError::Cancelled);
        }
        match attempt_fn(attempt) {
            Outcome::Success(response) => {
                if attempt > 1 {
                    tracing::debug!("request succeeded on attempt {}", attempt);
                }
                return Ok(response);
            }
            Outcome::Fail(err) => {
                tracing::debug!("attempt {} failed permanently: {}", attempt, err);
                return Err(err);
            }
            Outcome::Retry { wait, cause } => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts(),
                    wait_ms = wait_millis(wait),
                    "retrying after: {}",
                    cause
                );
                if sleeper.sleep(wait, cancel).is_err() {
                    return Err(ExecuteError::Cancelled);
                }
                attempt += 1;
            }
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn wait_millis(wait: Duration) -> u64 {
    u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)
}
