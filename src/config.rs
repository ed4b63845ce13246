//! Configuration management for TodoGenius.
//!
//! Configuration can be set via environment variables:
//! - `LM_STUDIO_BASE_URL` - Optional. Base URL of the LM Studio API. Defaults to `http://localhost:1234/v1`.
//! - `AI_MODEL_NAME` - Optional. Model identifier passed to LM Studio. Defaults to `qwen2.5-coder-1.5b-instruct`.
//! - `AI_MAX_TOKENS` - Optional. Completion token budget. Defaults to `400`.
//! - `AI_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.7`.
//! - `LM_STUDIO_TIMEOUT_SECS` - Optional. Completion request timeout in seconds. Defaults to `120`
//!   (generous, local models can be slow).
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `DATABASE_PATH` - Optional. SQLite database file. Defaults to `todogenius.db`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the LM Studio completion API
    pub lm_studio_base_url: String,

    /// Model identifier sent with every completion request
    pub model_name: String,

    /// Maximum tokens to generate per completion
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f64,

    /// Timeout for completion requests
    pub request_timeout: Duration,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lm_studio_base_url = std::env::var("LM_STUDIO_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:1234/v1".to_string());

        let model_name = std::env::var("AI_MODEL_NAME")
            .unwrap_or_else(|_| "qwen2.5-coder-1.5b-instruct".to_string());

        let max_tokens = std::env::var("AI_MAX_TOKENS")
            .unwrap_or_else(|_| "400".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("AI_MAX_TOKENS".to_string(), format!("{}", e)))?;

        let temperature = std::env::var("AI_TEMPERATURE")
            .unwrap_or_else(|_| "0.7".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("AI_TEMPERATURE".to_string(), format!("{}", e)))?;

        let timeout_secs: u64 = std::env::var("LM_STUDIO_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("LM_STUDIO_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("todogenius.db"));

        Ok(Self {
            lm_studio_base_url,
            model_name,
            max_tokens,
            temperature,
            request_timeout: Duration::from_secs(timeout_secs),
            host,
            port,
            database_path,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(lm_studio_base_url: String, model_name: String, database_path: PathBuf) -> Self {
        Self {
            lm_studio_base_url,
            model_name,
            max_tokens: 400,
            temperature: 0.7,
            request_timeout: Duration::from_secs(120),
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path,
        }
    }
}
