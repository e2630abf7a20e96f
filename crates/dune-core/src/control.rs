//! Cancellation: a shared abort token for in-flight requests.
//!
//! The executor checks the token before each attempt, the curl transport polls
//! it from its progress callback, and backoff sleeps wake up when it is set.
//! A caller (e.g. the CLI's Ctrl-C handler) keeps a clone and calls `cancel`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned when work is stopped by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cancelled by caller")
    }
}

impl std::error::Error for Cancelled {}

/// Cloneable abort flag. All clones observe the same state; once cancelled it
/// stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the token has fired.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
