//! casegen configuration stored in `casegen.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "casegen.toml";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no API key provided: environment variable {var} is not set")]
    MissingCredential { var: String },
    #[error("missing required input: {0}")]
    MissingInput(&'static str),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// casegen configuration (TOML).
///
/// Missing fields default to values that work against the public OpenAI API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CasegenConfig {
    pub model: String,

    /// Maximum output tokens per request. `0` picks a per-model default.
    pub max_tokens: u32,

    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Maximum number of code generation requests in flight.
    pub concurrency: usize,

    /// Pause before the single retry of a rate-limited or failed request.
    pub retry_backoff_secs: u64,

    /// Per-request HTTP timeout, including streamed bodies.
    pub request_timeout_secs: u64,

    /// Comment out merged bodies instead of emitting them as code.
    pub comment_bodies: bool,

    /// Where prompts and responses are appended as JSON lines.
    pub transcript_path: PathBuf,
}

impl Default for CasegenConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_tokens: 4000,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            concurrency: 2,
            retry_backoff_secs: 10,
            request_timeout_secs: 300,
            comment_bodies: false,
            transcript_path: PathBuf::from("casegen-debug.log"),
        }
    }
}

impl CasegenConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must be non-empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must be non-empty".to_string()));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "api_key_env must be non-empty".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be > 0".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective output token limit: 4000 for `gpt-4`, 2048 for other models
    /// unless set explicitly.
    pub fn effective_max_tokens(&self) -> u32 {
        match self.max_tokens {
            0 if self.model == "gpt-4" => 4000,
            0 => 2048,
            n => n,
        }
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the API key from the process environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key_with(|var| std::env::var(var).ok())
    }

    /// Resolve the API key through `lookup`; empty values count as missing.
    pub fn api_key_with<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(&self.api_key_env)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                var: self.api_key_env.clone(),
            })
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CasegenConfig::default()`.
pub fn load_config(path: &Path) -> Result<CasegenConfig> {
    if !path.exists() {
        let cfg = CasegenConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CasegenConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
