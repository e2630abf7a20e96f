use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::client::{ApiKey, CurlTransport, API_KEY_ENV};
use crate::retry::{RetryPolicy, DEFAULT_RETRYABLE_STATUS_CODES};

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// First backoff in seconds (e.g. 0.5 = 500ms); doubles per retry.
    pub initial_backoff_secs: f64,
    /// Backoff cap in seconds.
    pub max_backoff_secs: u64,
    /// Fixed jitter in milliseconds added to every backoff.
    pub jitter_ms: u64,
    /// HTTP statuses that are retried.
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_secs: 2.0,
            max_backoff_secs: 60,
            jitter_ms: 250,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
        }
    }
}

impl RetryConfig {
    /// Validate and convert into a policy.
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        let initial = Duration::try_from_secs_f64(self.initial_backoff_secs)
            .context("retry.initial_backoff_secs must be a non-negative number")?;
        let policy = RetryPolicy::new(
            self.max_attempts,
            initial,
            Duration::from_secs(self.max_backoff_secs),
            Duration::from_millis(self.jitter_ms),
            self.retryable_status_codes.iter().copied(),
        )
        .context("invalid [retry] section")?;
        Ok(policy)
    }
}

/// Global configuration loaded from `~/.config/dune/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuneConfig {
    /// Base URL that relative request paths are resolved against.
    pub base_url: String,
    /// API key sent as `X-DUNE-API-KEY`. `DUNE_API_KEY` in the environment wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// TCP/TLS connect timeout per attempt, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout per attempt, in seconds.
    pub timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for DuneConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dune.com/api/v1/".to_string(),
            api_key: None,
            connect_timeout_secs: 15,
            timeout_secs: 60,
            retry: None,
        }
    }
}

impl DuneConfig {
    /// Effective retry policy: the `[retry]` section, or the defaults.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        match &self.retry {
            Some(r) => r.to_policy(),
            None => Ok(RetryPolicy::default()),
        }
    }

    /// Key from the environment, else from the file. Empty values count as unset.
    pub fn api_key(&self) -> Option<ApiKey> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        from_env
            .or_else(|| self.api_key.clone())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(ApiKey::new)
    }

    pub fn transport(&self) -> CurlTransport {
        CurlTransport::new(
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.timeout_secs),
        )
    }

    /// Absolute http(s) URLs are used as-is; anything else is joined onto `base_url`.
    pub fn resolve_url(&self, target: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(target) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
            anyhow::bail!("unsupported URL scheme: {}", url.scheme());
        }
        let base = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        base.join(target.trim_start_matches('/'))
            .with_context(|| format!("cannot resolve {:?} against {}", target, base))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dune")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DuneConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init`, at an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<DuneConfig> {
    if !path.exists() {
        let default_cfg = DuneConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: DuneConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = DuneConfig::default();
        assert_eq!(cfg.base_url, "https://api.dune.com/api/v1/");
        assert_eq!(cfg.connect_timeout_secs, 15);
        assert_eq!(cfg.timeout_secs, 60);
        assert_eq!(cfg.retry_policy().unwrap(), RetryPolicy::default());
    }

    #[test]
    fn default_retry_section_matches_default_policy() {
        assert_eq!(RetryConfig::default().to_policy().unwrap(), RetryPolicy::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = DuneConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: DuneConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            base_url = "http://localhost:8080/api/"
            api_key = "k"
            connect_timeout_secs = 3
            timeout_secs = 10

            [retry]
            max_attempts = 3
            initial_backoff_secs = 0.5
            max_backoff_secs = 4
            jitter_ms = 0
            retryable_status_codes = [503]
        "#;
        let cfg: DuneConfig = toml::from_str(toml).unwrap();
        let p = cfg.retry_policy().unwrap();
        assert_eq!(p.max_attempts(), 3);
        assert_eq!(p.next_backoff(1), Duration::from_millis(500));
        assert_eq!(p.next_backoff(5), Duration::from_secs(4));
        assert!(p.is_retryable_status(503));
        assert!(!p.is_retryable_status(429));
    }

    #[test]
    fn invalid_retry_section_is_rejected() {
        let mut r = RetryConfig::default();
        r.max_attempts = 0;
        assert!(r.to_policy().is_err());
        let mut r = RetryConfig::default();
        r.initial_backoff_secs = -1.0;
        assert!(r.to_policy().is_err());
        let mut r = RetryConfig::default();
        r.max_backoff_secs = 1;
        assert!(r.to_policy().is_err());
    }

    #[test]
    fn resolve_relative_and_absolute_urls() {
        let cfg = DuneConfig::default();
        assert_eq!(
            cfg.resolve_url("/query/42/results").unwrap().as_str(),
            "https://api.dune.com/api/v1/query/42/results"
        );
        assert_eq!(
            cfg.resolve_url("http://127.0.0.1:9/x").unwrap().as_str(),
            "http://127.0.0.1:9/x"
        );
        assert!(cfg.resolve_url("ftp://example.com/x").is_err());
    }

    #[test]
    fn load_or_init_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let created = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, DuneConfig::default());

        fs::write(
            &path,
            "base_url = \"http://localhost/\"\nconnect_timeout_secs = 1\ntimeout_secs = 2\n",
        )
        .unwrap();
        let loaded = load_or_init_at(&path).unwrap();
        assert_eq!(loaded.base_url, "http://localhost/");
        assert_eq!(loaded.timeout_secs, 2);
        assert!(loaded.retry.is_none());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = 5").unwrap();
        let err = load_or_init_at(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }
}
