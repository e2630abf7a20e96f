//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod status_server;

use dune_core::client::Sleeper;
use dune_core::control::{CancelToken, Cancelled};
use std::sync::Mutex;
use std::time::Duration;

/// Records requested waits instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
        cancel.check()?;
        self.waits.lock().unwrap().push(duration);
        Ok(())
    }
}
