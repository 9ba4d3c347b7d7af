//! Log subscriber setup for shells embedding the core.
//!
//! The core only emits `tracing` events; installing a subscriber is the
//! shell's call.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::CoreConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Installs a fmt subscriber. `RUST_LOG` wins over `default_filter` when set
/// and valid.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

/// [`init_tracing`] with the configured `log_filter` as the fallback.
pub fn init_tracing_from(config: &CoreConfig) -> Result<(), TelemetryError> {
    init_tracing(&config.log_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_filter_is_parsed() {
        let config = CoreConfig {
            log_filter: "shared=notalevel".into(),
            ..CoreConfig::default()
        };
        // RUST_LOG takes precedence, so only check when it isn't set
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(
                init_tracing_from(&config),
                Err(TelemetryError::InvalidFilter(_))
            ));
        }
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        let _ = init_tracing(crate::DEFAULT_LOG_FILTER);
        assert!(matches!(
            init_tracing(crate::DEFAULT_LOG_FILTER),
            Err(TelemetryError::AlreadyInitialized(_))
        ));
    }
}
