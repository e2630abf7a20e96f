//! CLI for the Dune request executor.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dune_core::config::{self, DuneConfig};

use commands::{run_completions, run_config, run_request, run_schedule, RequestArgs};

/// Top-level CLI for the Dune API client.
#[derive(Debug, Parser)]
#[command(name = "dune")]
#[command(about = "Dune API client with rate-limit aware retries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send one request (retried per the configured policy) and print the JSON response.
    Request {
        /// Absolute http(s) URL, or a path relative to the configured base_url.
        target: String,

        /// HTTP method.
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Extra request header as "Name: value". Repeatable.
        #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// JSON request body (sent with Content-Type: application/json).
        #[arg(short, long)]
        data: Option<String>,

        /// Override the configured maximum number of attempts for this call.
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
    },

    /// Print the waits between attempts for the configured retry policy.
    Schedule,

    /// Show the config file location and effective settings.
    Config,

    /// Print a shell completion script to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse "Name: value" into a header pair.
fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected \"Name: value\", got {:?}", s))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name {:?}", name));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn load_config() -> Result<DuneConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: base_url={}", cfg.base_url);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Request {
                target,
                method,
                headers,
                data,
                max_attempts,
            } => {
                let args = RequestArgs {
                    target,
                    method,
                    headers,
                    data,
                    max_attempts,
                };
                run_request(&load_config()?, args).await?
            }
            CliCommand::Schedule => run_schedule(&load_config()?)?,
            CliCommand::Config => run_config(&load_config()?)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
