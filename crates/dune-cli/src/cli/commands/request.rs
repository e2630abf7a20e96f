//! `dune request <target>` – one request through the retrying executor.

use anyhow::{Context, Result};
use dune_core::client::{Executor, Request, API_KEY_ENV};
use dune_core::config::DuneConfig;
use dune_core::retry::{ExecuteError, RetryPolicy};

#[derive(Debug, Clone)]
pub struct RequestArgs {
    pub target: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub data: Option<String>,
    pub max_attempts: Option<u32>,
}

/// Request template cloned for every attempt.
pub(crate) fn build_request(url: &str, args: &RequestArgs) -> Request {
    let mut request = match &args.data {
        Some(body) => Request::new(args.method.as_str(), url)
            .header("Content-Type", "application/json")
            .body(body.as_bytes()),
        None => Request::new(args.method.as_str(), url),
    };
    for (name, value) in &args.headers {
        request.headers_mut().insert(name.as_str(), value.as_str());
    }
    request
}

/// The configured policy with the attempt count replaced.
pub(crate) fn with_max_attempts(policy: &RetryPolicy, max_attempts: u32) -> Result<RetryPolicy> {
    RetryPolicy::new(
        max_attempts,
        policy.initial_backoff(),
        policy.max_backoff(),
        policy.jitter(),
        policy.retryable_status_codes(),
    )
    .context("invalid --max-attempts")
}

fn report_failure(err: &ExecuteError) {
    let Some(op) = err.operation() else {
        return;
    };
    if let Some(rl) = op.rate_limit {
        eprintln!(
            "rate limit: {} of {} remaining, resets at unix {}",
            rl.remaining, rl.limit, rl.reset
        );
    }
    if !op.retry_after.is_zero() {
        eprintln!("server asked to retry after {}s", op.retry_after.as_secs());
    }
}

pub async fn run_request(cfg: &DuneConfig, args: RequestArgs) -> Result<()> {
    let url = cfg.resolve_url(&args.target)?;
    let configured = cfg.retry_policy()?;
    let policy = match args.max_attempts {
        Some(n) => with_max_attempts(&configured, n)?,
        None => configured.clone(),
    };

    let mut executor = Executor::new(cfg.transport(), configured);
    match cfg.api_key() {
        Some(key) => executor = executor.with_api_key(key),
        None => tracing::warn!(
            "no API key configured; set {} or api_key in the config file",
            API_KEY_ENV
        ),
    }

    let cancel = executor.cancel_token().clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling request");
            cancel.cancel();
        }
    });

    let template = build_request(url.as_str(), &args);
    tracing::info!("{} {} ({})", template.method(), template.url(), policy);
    let result = tokio::task::spawn_blocking(move || {
        executor.execute_with(
            &policy,
            || template.clone(),
            |response| serde_json::from_reader::<_, serde_json::Value>(response.into_body()),
        )
    })
    .await
    .context("request task join");
    interrupt.abort();

    match result? {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}
