use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Client configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the files + groups backend.
    pub base_url: String,
    /// Bearer token for the session, if one is already known.
    pub token: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Chunk size for streamed uploads, in bytes.
    pub upload_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
            upload_chunk_size: 64 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let base_url = std::env::var("FILE_API_BASE_URL").unwrap_or(defaults.base_url);

        let token = std::env::var("FILE_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let upload_chunk_size = std::env::var("UPLOAD_CHUNK_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.upload_chunk_size);

        let config = Config {
            base_url,
            token,
            request_timeout,
            upload_chunk_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "FILE_API_BASE_URL cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "FILE_API_BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.upload_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "UPLOAD_CHUNK_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
