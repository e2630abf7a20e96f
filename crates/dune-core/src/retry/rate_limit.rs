//! Rate-limit and Retry-After response headers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::client::Headers;

pub const RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
pub const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
pub const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
pub const RETRY_AFTER: &str = "Retry-After";

/// Quota snapshot reported by the server on one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: i64,
    pub remaining: i64,
    /// Unix timestamp (seconds) at which the quota resets.
    pub reset: i64,
}

impl RateLimitInfo {
    /// Parse the three `X-RateLimit-*` headers as signed integers. Missing,
    /// empty or unparseable values count as 0.
    ///
    /// Returns `None` when all three values are 0, so a lone
    /// `X-RateLimit-Remaining: 0` is indistinguishable from no headers.
    pub fn from_headers(headers: &Headers) -> Option<Self> {
        let info = Self {
            limit: header_i64(headers, RATE_LIMIT_LIMIT),
            remaining: header_i64(headers, RATE_LIMIT_REMAINING),
            reset: header_i64(headers, RATE_LIMIT_RESET),
        };
        if info.limit == 0 && info.remaining == 0 && info.reset == 0 {
            return None;
        }
        Some(info)
    }

    /// Reset instant, if a reset timestamp was reported.
    pub fn reset_at(&self) -> Option<SystemTime> {
        let secs = u64::try_from(self.reset).ok().filter(|&s| s > 0)?;
        UNIX_EPOCH.checked_add(Duration::from_secs(secs))
    }
}

/// `Retry-After` as whole seconds; zero when missing or not an integer.
/// HTTP-date values are not interpreted.
pub fn retry_after(headers: &Headers) -> Duration {
    Duration::from_secs(header_u64(headers, RETRY_AFTER))
}

fn header_u64(headers: &Headers, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

fn header_i64(headers: &Headers, name: &str) -> i64 {
    headers
        .get(name)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
}
