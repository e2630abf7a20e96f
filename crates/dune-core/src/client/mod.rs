//! HTTP client side: request/response types, transport, auth and the
//! retrying executor.

mod auth;
mod executor;
mod request;
mod sleep;
mod transport;

pub use auth::{ApiKey, API_KEY_ENV, API_KEY_HEADER};
pub use executor::{DecodeError, Executor};
pub use request::{canonical_reason, parse_status_line, Headers, Request, Response};
pub use sleep::{Sleeper, ThreadSleeper};
pub use transport::{CurlTransport, Transport};
