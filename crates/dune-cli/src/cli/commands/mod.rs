//! CLI command handlers. Each command is in its own file.

mod completions;
mod config;
mod request;
mod schedule;

pub use completions::run_completions;
pub use config::run_config;
pub use request::{run_request, RequestArgs};
pub use schedule::run_schedule;
