//! Retry and backoff policy.
//!
//! This module encapsulates the backoff schedule, response classification
//! (structured error bodies, rate-limit and Retry-After headers) and the retry
//! loop itself, so the executor only wires in transport and authentication.

mod classify;
mod error;
mod policy;
mod rate_limit;
mod run;

pub use classify::{
    decide_operation, decide_transport, error_message, operation_error, read_snippet,
    RetryDecision, SNIPPET_LIMIT,
};
pub use error::{ErrorKind, ExecuteError, OperationError, TransportError};
pub use policy::{PolicyError, RetryPolicy, DEFAULT_RETRYABLE_STATUS_CODES};
pub use rate_limit::{
    retry_after, RateLimitInfo, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET,
    RETRY_AFTER,
};

pub(crate) use classify::{classify_response, classify_transport};
pub(crate) use run::run_with_retry;
