//! Error types produced by the retrying executor.

use std::fmt;
use std::time::Duration;

use super::rate_limit::RateLimitInfo;

/// Failure to obtain any HTTP response from the transport.
#[derive(Debug)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection refused, DNS, etc.).
    Curl(curl::Error),
    /// Non-curl transport failed while sending or receiving.
    Io(std::io::Error),
    /// The caller's cancel token fired while the request was in flight.
    Cancelled,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Io(e) => write!(f, "{}", e),
            TransportError::Cancelled => write!(f, "transfer cancelled"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Io(e) => Some(e),
            TransportError::Cancelled => None,
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Curl(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

/// The API answered with a non-200 status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub status_code: u16,
    /// Reason phrase, e.g. "Service Unavailable". May be empty (HTTP/2).
    pub status_text: String,
    /// `error` field of a JSON error body, or the raw body snippet (at most 1024 bytes).
    pub message: String,
    pub rate_limit: Option<RateLimitInfo>,
    /// Server-declared `Retry-After`; zero when missing or unparseable.
    pub retry_after: Duration,
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http {}", self.status_code)?;
        if !self.status_text.is_empty() {
            write!(f, " {}", self.status_text)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for OperationError {}

/// Which side of the call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was obtained.
    Transport,
    /// Response was 200 but its body could not be decoded.
    Decode,
    /// The API rejected the call (non-200 status).
    Operation,
    /// The caller cancelled the call.
    Cancelled,
}

/// Terminal error of one `Executor::execute` call.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("failed to send request after {attempts} attempt(s)")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },
    #[error("failed to parse response")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("request was not successful: {0}")]
    Operation(OperationError),
    #[error("request cancelled")]
    Cancelled,
}

impl ExecuteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecuteError::Transport { .. } => ErrorKind::Transport,
            ExecuteError::Decode(_) => ErrorKind::Decode,
            ExecuteError::Operation(_) => ErrorKind::Operation,
            ExecuteError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The API error, when the call was rejected by the server.
    pub fn operation(&self) -> Option<&OperationError> {
        match self {
            ExecuteError::Operation(e) => Some(e),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.operation().map(|e| e.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(message: &str, status_text: &str) -> OperationError {
        OperationError {
            status_code: 503,
            status_text: status_text.to_string(),
            message: message.to_string(),
            rate_limit: None,
            retry_after: Duration::ZERO,
        }
    }

    #[test]
    fn operation_display_with_and_without_message() {
        assert_eq!(
            op("overloaded", "Service Unavailable").to_string(),
            "http 503 Service Unavailable: overloaded"
        );
        assert_eq!(op("", "Service Unavailable").to_string(), "http 503 Service Unavailable");
        assert_eq!(op("", "").to_string(), "http 503");
    }

    #[test]
    fn kinds_are_distinct() {
        let e = ExecuteError::Operation(op("x", ""));
        assert_eq!(e.kind(), ErrorKind::Operation);
        assert_eq!(e.status_code(), Some(503));
        assert_eq!(e.to_string(), "request was not successful: http 503: x");

        let e = ExecuteError::Transport {
            attempts: 3,
            source: TransportError::Cancelled,
        };
        assert_eq!(e.kind(), ErrorKind::Transport);
        assert!(e.operation().is_none());
        assert!(std::error::Error::source(&e).is_some());

        assert_eq!(ExecuteError::Cancelled.kind(), ErrorKind::Cancelled);
    }
}
