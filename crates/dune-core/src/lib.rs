//! Retrying request executor for the Dune HTTP API.
//!
//! [`client::Executor`] issues one logical request through a
//! [`client::Transport`], classifies each response, and retries transient
//! failures on the exponential schedule of a [`retry::RetryPolicy`], honoring
//! `Retry-After` when the server asks for a longer wait.

pub mod client;
pub mod config;
pub mod control;
pub mod logging;
pub mod retry;

