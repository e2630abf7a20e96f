//! Classify one attempt's outcome into success, retry or terminal failure.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;

use super::error::{ExecuteError, OperationError, TransportError};
use super::policy::RetryPolicy;
use super::rate_limit::{self, RateLimitInfo};
use crate::client::Response;

/// Maximum number of body bytes read from a non-200 response.
pub const SNIPPET_LIMIT: usize = 1024;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// What the retry loop does after one attempt. Every attempt ends in exactly
/// one of these.
#[derive(Debug)]
pub(crate) enum Outcome {
    Success(Response),
    Retry { wait: Duration, cause: String },
    Fail(ExecuteError),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Read at most [`SNIPPET_LIMIT`] bytes. A read error keeps whatever arrived first.
pub fn read_snippet<R: Read>(body: R) -> Vec<u8> {
    let mut snippet = Vec::with_capacity(256);
    if let Err(e) = body.take(SNIPPET_LIMIT as u64).read_to_end(&mut snippet) {
        tracing::debug!("error body read stopped early: {}", e);
    }
    snippet
}

/// Message for an error body: the `error` field of a JSON object when present
/// and non-empty, otherwise the raw bytes.
pub fn error_message(snippet: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(snippet) {
        Ok(body) if !body.error.is_empty() => body.error,
        _ => String::from_utf8_lossy(snippet).into_owned(),
    }
}

/// Build the error for a non-200 response. Consumes the response so its body is
/// released before the caller sleeps or returns.
pub fn operation_error(response: Response) -> OperationError {
    let rate_limit = RateLimitInfo::from_headers(response.headers());
    let retry_after = rate_limit::retry_after(response.headers());
    let status_code = response.status();
    let status_text = response.status_text().to_string();
    let snippet = read_snippet(response.into_body());
    OperationError {
        status_code,
        status_text,
        message: error_message(&snippet),
        rate_limit,
        retry_after,
    }
}

/// Decide on an API error: retry only for a retryable status with attempts
/// left, waiting the larger of the computed backoff and `Retry-After`.
pub fn decide_operation(policy: &RetryPolicy, attempt: u32, err: &OperationError) -> RetryDecision {
    if !policy.is_retryable_status(err.status_code) || !policy.has_attempts_left(attempt) {
        return RetryDecision::NoRetry;
    }
    RetryDecision::RetryAfter(policy.next_backoff(attempt).max(err.retry_after))
}

/// Decide on a transport failure: retried while attempts remain, except
/// cancellation which is never retried.
pub fn decide_transport(policy: &RetryPolicy, attempt: u32, err: &TransportError) -> RetryDecision {
    if matches!(err, TransportError::Cancelled) || !policy.has_attempts_left(attempt) {
        return RetryDecision::NoRetry;
    }
    RetryDecision::RetryAfter(policy.next_backoff(attempt))
}

pub(crate) fn classify_response(policy: &RetryPolicy, attempt: u32, response: Response) -> Outcome {
    if response.status() == 200 {
        return Outcome::Success(response);
    }
    let err = operation_error(response);
    match decide_operation(policy, attempt, &err) {
        RetryDecision::RetryAfter(wait) => Outcome::Retry {
            wait,
            cause: err.to_string(),
        },
        RetryDecision::NoRetry => Outcome::Fail(ExecuteError::Operation(err)),
    }
}

pub(crate) fn classify_transport(policy: &RetryPolicy, attempt: u32, err: TransportError) -> Outcome {
    match decide_transport(policy, attempt, &err) {
        RetryDecision::RetryAfter(wait) => Outcome::Retry {
            wait,
            cause: err.to_string(),
        },
        RetryDecision::NoRetry => match err {
            TransportError::Cancelled => Outcome::Fail(ExecuteError::Cancelled),
            source => Outcome::Fail(ExecuteError::Transport {
                attempts: attempt,
                source,
            }),
        },
    }
}
