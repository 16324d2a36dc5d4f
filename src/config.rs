//! Provider and analysis configuration
//!
//! Values come from the environment; the CLI layers flags on top.

use serde::Serialize;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_API_KEY: &str = "LEARNPULSE_API_KEY";
pub const ENV_FALLBACK_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "LEARNPULSE_BASE_URL";
pub const ENV_MODEL: &str = "LEARNPULSE_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "LEARNPULSE_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Connection settings for an OpenAI-compatible provider
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Environment variable the key was read from
    pub api_key_var: &'static str,
    pub base_url: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("api_key_var", &self.api_key_var)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (api_key, api_key_var) = [ENV_API_KEY, ENV_FALLBACK_API_KEY]
            .into_iter()
            .find_map(|var| non_empty(&lookup, var).map(|key| (key, var)))
            .ok_or(ConfigError::MissingVar(ENV_API_KEY))?;
        let base_url =
            non_empty(&lookup, ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: ENV_BASE_URL,
                value: base_url,
            });
        }

        Ok(Self {
            api_key,
            api_key_var,
            base_url,
        })
    }

    /// Whether the key came from `OPENAI_API_KEY` rather than `LEARNPULSE_API_KEY`
    pub fn uses_fallback_key(&self) -> bool {
        self.api_key_var == ENV_FALLBACK_API_KEY
    }
}

/// Sampling parameters for one kind of provider call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    /// Low variability for diagnostic analysis
    pub const ANALYSIS: SamplingParams = SamplingParams {
        temperature: 0.5,
        max_tokens: DEFAULT_MAX_TOKENS,
    };

    /// Higher variability for generative activity design
    pub const ACTIVITY: SamplingParams = SamplingParams {
        temperature: 0.7,
        max_tokens: DEFAULT_MAX_TOKENS,
    };
}

/// Settings applied by the analysis client to every call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub model: String,
    /// Upper bound on a single provider call
    pub timeout: Duration,
    pub analysis: SamplingParams,
    pub activity: SamplingParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            analysis: SamplingParams::ANALYSIS,
            activity: SamplingParams::ACTIVITY,
        }
    }
}

impl AnalysisConfig {
    /// Defaults overridden by `LEARNPULSE_MODEL` and `LEARNPULSE_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(model) = non_empty(&lookup, ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = non_empty(&lookup, ENV_TIMEOUT_SECS) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: ENV_TIMEOUT_SECS,
                    value: raw,
                })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
