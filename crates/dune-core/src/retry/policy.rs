use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Status codes retried by the default policy.
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Invalid retry policy parameters, reported at construction time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("initial backoff must be greater than zero")]
    ZeroInitialBackoff,
    #[error("max backoff ({max:?}) must not be smaller than initial backoff ({initial:?})")]
    MaxBelowInitial { initial: Duration, max: Duration },
}

/// Exponential backoff policy with a hard cap and fixed additive jitter.
///
/// Immutable once built; share it by reference (or clone it) across threads.
/// Use [`RetryPolicy::new`] to validate custom values, or `Default` for the
/// documented defaults (5 attempts, 2s initial, 60s max, 250ms jitter, retry on
/// 429/500/502/503/504).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    jitter: Duration,
    retryable_status_codes: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            jitter: Duration::from_millis(250),
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Build a policy, rejecting values that would make the schedule meaningless.
    ///
    /// An empty `retryable_status_codes` set is accepted: only transport
    /// failures are retried then.
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        jitter: Duration,
        retryable_status_codes: impl IntoIterator<Item = u16>,
    ) -> Result<Self, PolicyError> {
        if max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        if initial_backoff.is_zero() {
            return Err(PolicyError::ZeroInitialBackoff);
        }
        if max_backoff < initial_backoff {
            return Err(PolicyError::MaxBelowInitial {
                initial: initial_backoff,
                max: max_backoff,
            });
        }
        Ok(Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            jitter,
            retryable_status_codes: retryable_status_codes.into_iter().collect(),
        })
    }

    /// Maximum number of attempts (including the first).
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    pub fn retryable_status_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.retryable_status_codes.iter().copied()
    }

    pub fn is_retryable_status(&self, code: u16) -> bool {
        self.retryable_status_codes.contains(&code)
    }

    /// True while another attempt may follow `attempt` (1-based).
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Backoff to wait after a failed `attempt` (1-based).
    ///
    /// Doubles from `initial_backoff` once per earlier attempt; the first time
    /// the value would pass `max_backoff` it is clamped and doubling stops.
    /// The fixed jitter is added on top, so the result never exceeds
    /// `max_backoff + jitter`.
    pub fn next_backoff(&self, attempt: u32) -> Duration {
        let mut backoff = self.initial_backoff;
        for _ in 1..attempt {
            backoff = backoff.saturating_mul(2);
            if backoff >= self.max_backoff {
                backoff = self.max_backoff;
                break;
            }
        }
        backoff.saturating_add(self.jitter)
    }

    /// Waits between consecutive attempts: one entry per retry, so
    /// `max_attempts - 1` entries in total.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts).map(|a| self.next_backoff(a)).collect()
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self
            .retryable_status_codes
            .iter()
            .map(|c| c.to_string())
            .collect();
        write!(
            f,
            "{} attempts, backoff {:?}..{:?} + {:?} jitter, retry on [{}]",
            self.max_attempts,
            self.initial_backoff,
            self.max_backoff,
            self.jitter,
            codes.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_CODES: [u16; 0] = [];

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn first_attempt_is_initial_plus_jitter() {
        let p = RetryPolicy::default();
        assert_eq!(p.next_backoff(1), secs(2) + Duration::from_millis(250));
    }

    #[test]
    fn doubles_then_clamps_at_max() {
        let p = RetryPolicy::default();
        let j = p.jitter();
        let expected = [2, 4, 8, 16, 32, 60];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(p.next_backoff(i as u32 + 1), secs(*want) + j, "attempt {}", i + 1);
        }
        assert_eq!(p.next_backoff(7), secs(60) + j);
        assert_eq!(p.next_backoff(1000), secs(60) + j);
    }

    #[test]
    fn backoff_is_non_decreasing_and_bounded() {
        let p = RetryPolicy::new(
            50,
            Duration::from_millis(300),
            secs(45),
            Duration::from_millis(10),
            [503],
        )
        .unwrap();
        let mut prev = Duration::ZERO;
        for attempt in 1..=200 {
            let d = p.next_backoff(attempt);
            assert!(d >= prev, "attempt {attempt} went down");
            assert!(d <= p.max_backoff() + p.jitter());
            prev = d;
        }
    }

    #[test]
    fn zero_jitter_adds_nothing() {
        let p = RetryPolicy::new(3, secs(1), secs(10), Duration::ZERO, NO_CODES).unwrap();
        assert_eq!(p.next_backoff(1), secs(1));
        assert_eq!(p.next_backoff(3), secs(4));
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let p = RetryPolicy::new(3, secs(1), Duration::MAX, Duration::ZERO, NO_CODES).unwrap();
        assert_eq!(p.next_backoff(u32::MAX), Duration::MAX);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            RetryPolicy::new(0, secs(1), secs(2), Duration::ZERO, NO_CODES),
            Err(PolicyError::ZeroAttempts)
        );
        assert_eq!(
            RetryPolicy::new(1, Duration::ZERO, secs(2), Duration::ZERO, NO_CODES),
            Err(PolicyError::ZeroInitialBackoff)
        );
        assert!(matches!(
            RetryPolicy::new(1, secs(3), secs(2), Duration::ZERO, NO_CODES),
            Err(PolicyError::MaxBelowInitial { .. })
        ));
    }

    #[test]
    fn default_retryable_codes() {
        let p = RetryPolicy::default();
        for code in [429, 500, 502, 503, 504] {
            assert!(p.is_retryable_status(code));
        }
        assert!(!p.is_retryable_status(404));
        assert!(!p.is_retryable_status(501));
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy::new(3, secs(1), secs(8), Duration::ZERO, [503]).unwrap();
        assert!(p.has_attempts_left(1));
        assert!(p.has_attempts_left(2));
        assert!(!p.has_attempts_left(3));
        assert_eq!(p.schedule(), vec![secs(1), secs(2)]);
    }
}
