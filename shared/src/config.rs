//! Core configuration, loadable from TOML.
//!
//! Every field has a default matching the public PokeAPI, so shells only need
//! a file to override something.

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::{
    DEFAULT_API_BASE_URL, DEFAULT_INDEX_LIMIT, DEFAULT_LOG_FILTER, DEFAULT_MOVES_DISPLAY_LIMIT,
    DEFAULT_REQUEST_TIMEOUT_MS,
};

pub const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub index_limit: u32,
    pub moves_display_limit: usize,
    pub log_filter: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            index_limit: DEFAULT_INDEX_LIMIT,
            moves_display_limit: DEFAULT_MOVES_DISPLAY_LIMIT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl CoreConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if let Err(reason) = check_base_url(&self.api_base_url) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason,
            });
        }
        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: format!("must be between 1 and {MAX_REQUEST_TIMEOUT_MS}"),
            });
        }
        if self.index_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index_limit",
                reason: "must be > 0".to_string(),
            });
        }
        if self.moves_display_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "moves_display_limit",
                reason: "must be > 0".to_string(),
            });
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.log_filter) {
            return Err(ConfigError::InvalidValue {
                field: "log_filter",
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err("missing host".to_string()),
    }
}
