//! Configuration management for storyloom
//!
//! Optional settings live in ~/.config/storyloom/config.json. Environment
//! variables override the file, and the file overrides built-in defaults.

use crate::llm::client::DEFAULT_BASE_URL;
use crate::llm::models::ReasoningEffort;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_MAX_TOOL_CALLS: usize = 20;
pub const DEFAULT_FALLBACK_FILE_LIMIT: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Model calls allowed per story while gathering implementation context
    pub max_tool_calls: Option<usize>,
    /// Paths kept when the loop falls back to what it observed
    pub fallback_file_limit: Option<usize>,
    /// Per model call; an expired call fails that story's enrichment
    pub request_timeout_secs: Option<u64>,
    pub api_base_url: Option<String>,
}

impl Config {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("storyloom"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file. Missing files give defaults; a corrupt file
    /// logs a warning and also gives defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "config file is corrupted, using defaults"
                );
                Self::default()
            }
        }
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub reasoning_effort: ReasoningEffort,
    pub max_tool_calls: usize,
    pub fallback_file_limit: usize,
    pub request_timeout: Duration,
    pub api_base_url: String,
}

impl Settings {
    /// Resolve from the on-disk config and the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::resolve(&Config::load(), |key| std::env::var(key).ok())
    }

    /// Resolve `config` with `env` taking precedence.
    pub fn resolve<F>(config: &Config, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = env("OPENAI_API_KEY")
            .or_else(|| config.openai_api_key.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "OPENAI_API_KEY is not set. Export it or add openai_api_key to {}",
                    Config::config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "the config file".to_string())
                )
            })?;

        let model = env("MODEL")
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let reasoning_effort = match env("REASONING_EFFORT") {
            Some(raw) => raw.parse()?,
            None => config.reasoning_effort.unwrap_or_default(),
        };

        let max_tool_calls = match env("STORYLOOM_MAX_TOOL_CALLS") {
            Some(raw) => parse_number("STORYLOOM_MAX_TOOL_CALLS", &raw)?,
            None => config.max_tool_calls.unwrap_or(DEFAULT_MAX_TOOL_CALLS),
        };

        let timeout_secs = match env("STORYLOOM_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_number("STORYLOOM_REQUEST_TIMEOUT_SECS", &raw)?,
            None => config
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeout must be at least 1 second"));
        }

        let api_base_url = env("OPENAI_BASE_URL")
            .or_else(|| config.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            model,
            reasoning_effort,
            max_tool_calls,
            fallback_file_limit: config
                .fallback_file_limit
                .unwrap_or(DEFAULT_FALLBACK_FILE_LIMIT),
            request_timeout: Duration::from_secs(timeout_secs),
            api_base_url,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer, got '{}'", name, raw))
}
