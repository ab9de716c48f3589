// Judge pipeline configuration
// Loaded from config/judge.json when present, then overridden by environment

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/judge.json";

/// Judge0 language id for C++ (GCC 9.2.0)
pub const CPP_LANGUAGE_ID: u32 = 54;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    pub language_id: u32,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub request_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_sweep_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://judge0-ce.p.rapidapi.com".to_string(),
            api_key: None,
            api_host: Some("judge0-ce.p.rapidapi.com".to_string()),
            language_id: CPP_LANGUAGE_ID,
            poll_interval_ms: 1500,
            max_poll_attempts: 10,
            request_timeout_ms: 10_000,
            cache_ttl_secs: 300,
            cache_sweep_secs: 60,
        }
    }
}

impl JudgeConfig {
    /// Load from a JSON file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: JudgeConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default file if it exists, then environment overrides
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `JUDGE_*` / `RESULT_CACHE_*` overrides from a variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("JUDGE_API_URL") {
            self.api_url = url;
        }
        if let Some(key) = lookup("JUDGE_API_KEY") {
            self.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(host) = lookup("JUDGE_API_HOST") {
            self.api_host = Some(host).filter(|h| !h.is_empty());
        }
        if let Some(v) = lookup("JUDGE_LANGUAGE_ID") {
            self.language_id = parse_var("JUDGE_LANGUAGE_ID", &v)?;
        }
        if let Some(v) = lookup("JUDGE_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_var("JUDGE_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("JUDGE_MAX_POLL_ATTEMPTS") {
            self.max_poll_attempts = parse_var("JUDGE_MAX_POLL_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("JUDGE_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_var("JUDGE_REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("RESULT_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_var("RESULT_CACHE_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("RESULT_CACHE_SWEEP_SECS") {
            self.cache_sweep_secs = parse_var("RESULT_CACHE_SWEEP_SECS", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            bail!("api_url must not be empty");
        }
        if self.max_poll_attempts == 0 {
            bail!("max_poll_attempts must be at least 1");
        }
        if self.cache_sweep_secs == 0 {
            bail!("cache_sweep_secs must be at least 1");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", name, value, e))
}
