//! Runtime configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by `main`). Every field has a default so the service starts against a
//! stock local Ollama install with no configuration at all.

use std::env;
use std::str::FromStr;

use url::Url;
use validator::Validate;

use crate::error::AppError;

pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.2";

/// Settings for the LLM server the pipeline talks to.
#[derive(Debug, Clone, Validate)]
pub struct LlmConfig {
    /// Base URL of the Ollama-compatible server, without trailing slash.
    #[validate(length(min = 1))]
    pub base_url: String,
    /// Model name passed with every chat request.
    #[validate(length(min = 1))]
    pub model: String,
    /// Sampling temperature. Value between 0.0 and 2.0.
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    /// Optional bearer token sent as `Authorization` header.
    pub auth_token: Option<String>,
    /// Upper bound for a single HTTP exchange with the server.
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.7,
            auth_token: None,
            timeout_secs: 120,
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    #[validate(nested)]
    pub llm: LlmConfig,
    /// Longest accepted message, in characters.
    #[validate(range(min = 1))]
    pub max_message_length: usize,
    /// Most messages accepted by one batch request.
    #[validate(range(min = 1, max = 100))]
    pub max_batch_size: usize,
    /// Requests allowed per client within `rate_limit_window_secs`.
    #[validate(range(min = 1))]
    pub rate_limit_requests: usize,
    #[validate(range(min = 1))]
    pub rate_limit_window_secs: u64,
    /// Run the reasoning stage for every request, not only those asking for it.
    pub enable_reasoning: bool,
    /// Key the rate limiter on `Forwarded`/`X-Forwarded-For` instead of the
    /// TCP peer. Only safe behind a reverse proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            llm: LlmConfig::default(),
            max_message_length: 1000,
            max_batch_size: 10,
            rate_limit_requests: 60,
            rate_limit_window_secs: 60,
            enable_reasoning: false,
            trust_proxy_headers: false,
        }
    }
}

impl AppConfig {
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset, then validates the result.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let base_url: String = env_or("LLM_BASE_URL", defaults.llm.base_url)?;
        let config = Self {
            host: env_or("SOULBUDDY_HOST", defaults.host)?,
            port: env_or("SOULBUDDY_PORT", defaults.port)?,
            llm: LlmConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                model: env_or("LLM_MODEL", defaults.llm.model)?,
                temperature: env_or("LLM_TEMPERATURE", defaults.llm.temperature)?,
                auth_token: env::var("LLM_AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
                timeout_secs: env_or("LLM_TIMEOUT_SECS", defaults.llm.timeout_secs)?,
            },
            max_message_length: env_or("MAX_MESSAGE_LENGTH", defaults.max_message_length)?,
            max_batch_size: env_or("MAX_BATCH_SIZE", defaults.max_batch_size)?,
            rate_limit_requests: env_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            rate_limit_window_secs: env_or(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,
            enable_reasoning: env_or("ENABLE_REASONING", defaults.enable_reasoning)?,
            trust_proxy_headers: env_or("TRUST_PROXY_HEADERS", defaults.trust_proxy_headers)?,
        };

        config.check()?;
        Ok(config)
    }

    /// Field-level validation plus a parse of the LLM base URL.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::Config(format!("Invalid configuration: {}", e)))?;
        Url::parse(&self.llm.base_url)?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        _ => Ok(default),
    }
}
