//! API key injection.

use std::fmt;

use super::Request;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-DUNE-API-KEY";

/// Environment variable that overrides the configured key.
pub const API_KEY_ENV: &str = "DUNE_API_KEY";

/// API credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Set the key header, replacing one the request may already carry.
    pub fn apply(&self, request: &mut Request) {
        request.headers_mut().insert(API_KEY_HEADER, self.0.as_str());
    }

    /// Key with all but the last four characters masked.
    pub fn redacted(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.redacted())
    }
}
