//! Transport seam and the libcurl implementation.

use std::cell::Cell;
use std::io::Cursor;
use std::str;
use std::time::Duration;

use super::request::{canonical_reason, parse_status_line, Headers, Request, Response};
use crate::control::CancelToken;
use crate::retry::{TransportError, SNIPPET_LIMIT};

/// Performs exactly one HTTP exchange. Returns `Err` only when no response
/// was obtained; any HTTP status, including errors, is `Ok`.
pub trait Transport {
    fn send(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        (**self).send(request, cancel)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        (**self).send(request, cancel)
    }
}

/// Blocking transport on a fresh curl easy handle per request.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
/// Bodies of non-200 responses are buffered only up to [`SNIPPET_LIMIT`] bytes.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    timeout: Duration,
    user_agent: String,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
            user_agent: format!("dune-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CurlTransport {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Transport for CurlTransport {
    fn send(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(request.url())?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.useragent(&self.user_agent)?;
        // Needed for the progress callback (cancel polling) to run.
        easy.progress(true)?;

        match (request.method(), request.body_bytes()) {
            ("GET", None) => {}
            ("HEAD", _) => easy.nobody(true)?,
            ("POST", Some(body)) => easy.post_fields_copy(body)?,
            (method, Some(body)) => {
                easy.post_fields_copy(body)?;
                easy.custom_request(method)?;
            }
            (method, None) => easy.custom_request(method)?,
        }

        let mut list = curl::easy::List::new();
        for (k, v) in request.headers().iter() {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !request.headers().is_empty() {
            easy.http_headers(list)?;
        }

        let status = Cell::new(0u16);
        let mut reason = String::new();
        let mut headers = Headers::new();
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    // A new status line starts a new response (redirect, 100 Continue);
                    // keep only the last response's headers.
                    if let Some((code, text)) = parse_status_line(line) {
                        status.set(code);
                        reason = text;
                        headers.clear();
                    } else {
                        headers.push_line(line);
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                if status.get() == 200 {
                    body.extend_from_slice(data);
                } else {
                    let room = SNIPPET_LIMIT.saturating_sub(body.len());
                    body.extend_from_slice(&data[..room.min(data.len())]);
                }
                // Report everything as consumed so curl drains the connection.
                Ok(data.len())
            })?;
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            if let Err(e) = transfer.perform() {
                if e.is_aborted_by_callback() && cancel.is_cancelled() {
                    return Err(TransportError::Cancelled);
                }
                return Err(TransportError::Curl(e));
            }
        }

        let code = easy.response_code()? as u16;
        if reason.is_empty() {
            reason = canonical_reason(code).to_string();
        }
        tracing::trace!("{} {} -> {} ({} body bytes)", request.method(), request.url(), code, body.len());
        Ok(Response::new(code, reason, headers, Cursor::new(body)))
    }
}
