//! Configuration file loading and layering.
//!
//! The client reads `civic.toml`. Sources, highest priority first:
//! 1. Environment (`CIVIC_API_URL`, `CIVIC_SESSION_FILE`)
//! 2. File passed with `--config`
//! 3. User config (`~/.config/civic/civic.toml`)
//! 4. Defaults (hardcoded)
//!
//! Missing files are not an error; malformed ones are.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::validation::DEFAULT_FREE_REPORT_LIMIT;

pub const CONFIG_FILE_NAME: &str = "civic.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

pub const ENV_API_URL: &str = "CIVIC_API_URL";
pub const ENV_SESSION_FILE: &str = "CIVIC_SESSION_FILE";

/// Root structure of `civic.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CivicConfig {
    pub api: Option<ApiConfig>,
    pub retry: Option<RetryConfig>,
    pub session: Option<SessionConfig>,
    pub quota: Option<QuotaConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout_secs: Option<u64>,
}

/// Backoff for idempotent reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Where the session is persisted
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotaConfig {
    /// Reports allowed to a free citizen account
    pub free_report_limit: Option<usize>,
}

impl CivicConfig {
    /// Parse a config file. Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Default location of the user-level config file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("civic").join(CONFIG_FILE_NAME))
}

/// Default location of the persisted session
pub fn default_session_path() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("civic")
        .join("session.json")
}

/// Collects config sources before merging.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    user_config: Option<CivicConfig>,
    explicit_config: Option<CivicConfig>,
    env: HashMap<String, String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the user-level config if there is one.
    pub fn with_user_config(mut self) -> Result<Self> {
        if let Some(path) = user_config_path() {
            self.user_config = Some(CivicConfig::load(&path)?);
        }
        Ok(self)
    }

    /// Add a config file named on the command line.
    pub fn with_file(mut self, path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        self.explicit_config = Some(CivicConfig::load(path)?);
        Ok(self)
    }

    /// Snapshot the `CIVIC_*` environment.
    pub fn with_process_env(mut self) -> Self {
        for (key, value) in std::env::vars() {
            if key.starts_with("CIVIC_") {
                self.env.insert(key, value);
            }
        }
        self
    }

    /// Set a single environment override (used by tests).
    pub fn with_env_var(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> EffectiveConfig {
        EffectiveConfig {
            user_config: self.user_config.unwrap_or_default(),
            explicit_config: self.explicit_config.unwrap_or_default(),
            env: self.env,
        }
    }
}

/// Merged view over all sources.
#[derive(Debug, Default)]
pub struct EffectiveConfig {
    user_config: CivicConfig,
    explicit_config: CivicConfig,
    env: HashMap<String, String>,
}

impl EffectiveConfig {
    /// First value found, explicit file before user file.
    fn pick<T>(&self, f: impl Fn(&CivicConfig) -> Option<T>) -> Option<T> {
        f(&self.explicit_config).or_else(|| f(&self.user_config))
    }

    fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn base_url(&self) -> String {
        self.env_var(ENV_API_URL)
            .map(str::to_string)
            .or_else(|| self.pick(|c| c.api.as_ref()?.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        let secs = self
            .pick(|c| c.api.as_ref()?.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self
                .pick(|c| c.retry.as_ref()?.max_attempts)
                .unwrap_or(defaults.max_attempts)
                .max(1),
            initial_backoff: self
                .pick(|c| c.retry.as_ref()?.initial_backoff_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: self
                .pick(|c| c.retry.as_ref()?.max_backoff_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
        }
    }

    pub fn session_file(&self) -> PathBuf {
        self.env_var(ENV_SESSION_FILE)
            .map(PathBuf::from)
            .or_else(|| self.pick(|c| c.session.as_ref()?.file.clone()))
            .unwrap_or_else(default_session_path)
    }

    pub fn free_report_limit(&self) -> usize {
        self.pick(|c| c.quota.as_ref()?.free_report_limit)
            .unwrap_or(DEFAULT_FREE_REPORT_LIMIT)
    }
}
