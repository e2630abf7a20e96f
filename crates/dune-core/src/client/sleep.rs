//! Backoff sleeping.

use std::time::{Duration, Instant};

use crate::control::{CancelToken, Cancelled};

/// Blocks between attempts. Implementations must return early with
/// `Err(Cancelled)` once the token fires.
pub trait Sleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled>;
}

/// Sleeps on the calling thread in short slices, waking early on cancel.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSleeper {
    slice: Duration,
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self {
            slice: Duration::from_millis(50),
        }
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
        // A deadline past what `Instant` can represent means waiting until cancelled.
        let deadline = Instant::now().checked_add(duration);
        loop {
            cancel.check()?;
            let step = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    self.slice.min(deadline - now)
                }
                None => self.slice,
            };
            std::thread::sleep(step);
        }
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
        (**self).sleep(duration, cancel)
    }
}
