//! `dune config` – print config location and effective settings.

use anyhow::Result;
use dune_core::client::API_KEY_ENV;
use dune_core::config::{self, DuneConfig};

pub fn run_config(cfg: &DuneConfig) -> Result<()> {
    println!("config file:     {}", config::config_path()?.display());
    println!("base_url:        {}", cfg.base_url);
    let key = match cfg.api_key() {
        Some(k) if std::env::var_os(API_KEY_ENV).is_some() => format!("{} (from {})", k.redacted(), API_KEY_ENV),
        Some(k) => k.redacted(),
        None => "(not set)".to_string(),
    };
    println!("api_key:         {}", key);
    println!("connect timeout: {}s", cfg.connect_timeout_secs);
    println!("timeout:         {}s", cfg.timeout_secs);
    println!("retry:           {}", cfg.retry_policy()?);
    Ok(())
}
