//! Configuration management for Tiny Agent.
//!
//! Configuration can be set via environment variables:
//! - `LLM_API_KEY` - Required. API key for the chat-completion service.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to `https://api.siliconflow.cn/v1`.
//! - `DEFAULT_MODEL` - Optional. The model to use. Defaults to `Qwen/Qwen2.5-32B-Instruct`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_TURNS` - Optional. Maximum model/tool round-trips per user turn. Defaults to `10`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Timeout for outbound HTTP calls. Defaults to `60`.
//! - `WIKIPEDIA_URL` - Optional. Wikipedia base URL for the search tool. Defaults to `https://en.wikipedia.org`.
//! - `SYSTEM_PROMPT` - Optional. Overrides the built-in system prompt.
//! - `SESSION_IDLE_TTL_SECS` - Optional. Idle time after which a session is evicted. Defaults to `3600`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1";
pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-32B-Instruct";
pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_MAX_TURNS: usize = 10;
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the completion service
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API (without `/chat/completions`)
    pub base_url: String,

    /// Model identifier sent with every completion request
    pub default_model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum model/tool round-trips within one user turn
    pub max_turns: usize,

    /// Timeout applied to outbound HTTP requests
    pub request_timeout: Duration,

    /// Base URL used by the `search_wikipedia` tool
    pub wikipedia_url: String,

    /// System prompt override; `None` uses the built-in prompt
    pub system_prompt: Option<String>,

    /// Sessions untouched for this long are evicted
    pub session_idle_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `LLM_API_KEY` is not set, and
    /// `ConfigError::InvalidValue` for unparsable or out-of-range numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("LLM_API_KEY".to_string()))?;

        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let default_model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env_parse("PORT", 3000u16)?;

        let max_turns = env_parse("MAX_TURNS", DEFAULT_MAX_TURNS)?;
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_TURNS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let timeout_secs = env_parse("REQUEST_TIMEOUT_SECS", 60u64)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "REQUEST_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let wikipedia_url = std::env::var("WIKIPEDIA_URL")
            .unwrap_or_else(|_| DEFAULT_WIKIPEDIA_URL.to_string());

        let system_prompt = std::env::var("SYSTEM_PROMPT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let ttl_secs = env_parse("SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL.as_secs())?;
        if ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_IDLE_TTL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            base_url,
            default_model,
            host,
            port,
            max_turns,
            request_timeout: Duration::from_secs(timeout_secs),
            wikipedia_url,
            system_prompt,
            session_idle_ttl: Duration::from_secs(ttl_secs),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_turns: DEFAULT_MAX_TURNS,
            request_timeout: Duration::from_secs(60),
            wikipedia_url: DEFAULT_WIKIPEDIA_URL.to_string(),
            system_prompt: None,
            session_idle_ttl: DEFAULT_SESSION_IDLE_TTL,
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_defaults() {
        let config = Config::new("key".to_string(), "model".to_string());
        assert_eq!(config.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.system_prompt.is_none());
        assert_eq!(config.session_idle_ttl, DEFAULT_SESSION_IDLE_TTL);
    }

    #[test]
    fn env_parse_falls_back_to_default_when_unset() {
        let value: u16 = env_parse("TINY_AGENT_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn env_parse_reports_invalid_values() {
        std::env::set_var("TINY_AGENT_TEST_BAD_PORT", "not-a-port");
        let err = env_parse::<u16>("TINY_AGENT_TEST_BAD_PORT", 3000).unwrap_err();
        match err {
            ConfigError::InvalidValue(key, _) => assert_eq!(key, "TINY_AGENT_TEST_BAD_PORT"),
            other => panic!("unexpected error: {other:?}"),
        }
        std::env::remove_var("TINY_AGENT_TEST_BAD_PORT");
    }
}
