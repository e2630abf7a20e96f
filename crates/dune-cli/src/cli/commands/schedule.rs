//! `dune schedule` – show backoff waits for the configured retry policy.

use anyhow::Result;
use dune_core::config::DuneConfig;
use dune_core::retry::RetryPolicy;
use std::time::Duration;

/// One line per retry: the attempt that failed, the wait, and the total so far.
pub(crate) fn schedule_rows(policy: &RetryPolicy) -> Vec<(u32, Duration, Duration)> {
    let mut total = Duration::ZERO;
    policy
        .schedule()
        .into_iter()
        .zip(1u32..)
        .map(|(wait, attempt)| {
            total = total.saturating_add(wait);
            (attempt, wait, total)
        })
        .collect()
}

pub fn run_schedule(cfg: &DuneConfig) -> Result<()> {
    let policy = cfg.retry_policy()?;
    println!("Policy: {}", policy);
    let rows = schedule_rows(&policy);
    if rows.is_empty() {
        println!("Single attempt; no retries.");
        return Ok(());
    }
    println!("  {:>7}  {:>10}  {:>10}", "After", "Wait(s)", "Total(s)");
    println!("  {}  {}  {}", "-------", "----------", "----------");
    for (attempt, wait, total) in rows {
        println!(
            "  {:>7}  {:>10.3}  {:>10.3}",
            attempt,
            wait.as_secs_f64(),
            total.as_secs_f64()
        );
    }
    println!("Retry-After from the server replaces a wait when it is longer.");
    Ok(())
}
