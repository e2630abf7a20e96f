//! The request executor: one logical call, retried per the policy.

use serde::de::DeserializeOwned;

use super::auth::ApiKey;
use super::request::{Request, Response};
use super::sleep::{Sleeper, ThreadSleeper};
use super::transport::Transport;
use crate::control::CancelToken;
use crate::retry::{self, ExecuteError, RetryPolicy};

/// Boxed decode failure, kept distinct from API and transport errors.
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// Runs requests through a transport with retries, backoff and auth.
///
/// Holds no per-call state: `execute` takes `&self`, so one executor can be
/// shared across threads when its transport and sleeper are `Sync`.
pub struct Executor<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
    api_key: Option<ApiKey>,
    cancel: CancelToken,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper: ThreadSleeper::default(),
            policy,
            api_key: None,
            cancel: CancelToken::new(),
        }
    }
}

impl<T: Transport, S: Sleeper> Executor<T, S> {
    /// Replace how backoff waits are performed.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Executor<T, S2> {
        Executor {
            transport: self.transport,
            sleeper,
            policy: self.policy,
            api_key: self.api_key,
            cancel: self.cancel,
        }
    }

    pub fn with_api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Use a caller-owned token; cancelling it stops in-flight and future calls.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Execute with the executor's own policy. See [`Executor::execute_with`].
    pub fn execute<R, E, B, D>(&self, build_request: B, decode: D) -> Result<R, ExecuteError>
    where
        B: FnMut() -> Request,
        D: FnOnce(Response) -> Result<R, E>,
        E: Into<DecodeError>,
    {
        self.execute_with(&self.policy, build_request, decode)
    }

    /// Execute one logical request under `policy`.
    ///
    /// `build_request` is called once per attempt. A 200 response goes to
    /// `decode` untouched; decode failures are never retried. Non-200
    /// responses and transport failures are retried as the policy allows.
    pub fn execute_with<R, E, B, D>(
        &self,
        policy: &RetryPolicy,
        mut build_request: B,
        decode: D,
    ) -> Result<R, ExecuteError>
    where
        B: FnMut() -> Request,
        D: FnOnce(Response) -> Result<R, E>,
        E: Into<DecodeError>,
    {
        let response = retry::run_with_retry(policy, &self.sleeper, &self.cancel, |attempt| {
            let mut request = build_request();
            if let Some(key) = &self.api_key {
                key.apply(&mut request);
            }
            tracing::debug!("{} {} (attempt {})", request.method(), request.url(), attempt);
            match self.transport.send(&request, &self.cancel) {
                Ok(response) => retry::classify_response(policy, attempt, response),
                Err(e) => retry::classify_transport(policy, attempt, e),
            }
        })?;
        decode(response).map_err(|e| ExecuteError::Decode(e.into()))
    }

    /// Execute and decode a 200 body as JSON.
    pub fn execute_json<R, B>(&self, build_request: B) -> Result<R, ExecuteError>
    where
        R: DeserializeOwned,
        B: FnMut() -> Request,
    {
        self.execute(build_request, |response| {
            serde_json::from_reader::<_, R>(response.into_body())
        })
    }
}
