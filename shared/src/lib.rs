// lib.rs - Pokedex shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod gateway;
pub mod lineage;
pub mod model;
pub mod search;
pub mod telemetry;
pub mod view;

#[cfg(feature = "shell")]
pub mod shell;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect, EffectFfi, FetchResult};
pub use config::{ConfigError, CoreConfig};
pub use crux_core::Core;
pub use event::Event;
pub use gateway::{Gateway, GatewayError};
pub use lineage::{flatten, try_flatten, LineageError, LineageNode};
pub use model::{
    CategoryRef, DetailRecord, IndexEntry, LoadPhase, Model, MoveRef, PendingSelection,
    SelectedDetail, SelectionFailure,
};
pub use search::{filter_index, SearchState};
pub use view::{DetailView, ResultItem, SelectionErrorView, UserFacingError, ViewModel, ViewState};

pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_INDEX_LIMIT: u32 = 151;
pub const DEFAULT_MOVES_DISPLAY_LIMIT: usize = 4;
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_RATE_LIMIT_RETRY_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    RateLimited,
    Server,
    Deserialization,
    Configuration,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network
            | Self::Timeout
            | Self::RateLimited
            | Self::Server
            | Self::Deserialization => ErrorSeverity::Transient,

            Self::NotFound
            | Self::Configuration
            | Self::InvalidState
            | Self::Internal
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server | Self::Deserialization
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub retry_after_ms: Option<u64>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            retry_after_ms: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_retry_after(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to reach the Pokedex. Please check your internet connection and try again."
                    .into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::NotFound => match self.context.get("name") {
                Some(name) => format!("No Pokemon named \"{name}\" could be found."),
                None => "The requested Pokemon could not be found.".into(),
            },
            ErrorKind::RateLimited => {
                if let Some(retry_after) = self.retry_after_ms {
                    let seconds = retry_after / 1000;
                    format!("Too many requests. Please wait {seconds} seconds and try again.")
                } else {
                    "Too many requests. Please wait a moment and try again.".into()
                }
            }
            ErrorKind::Server => {
                "The Pokedex service is having trouble right now. Please try again.".into()
            }
            ErrorKind::Deserialization => {
                "The Pokedex sent data we couldn't read. Please try again.".into()
            }
            ErrorKind::Configuration => self.message.clone(),
            ErrorKind::InvalidState | ErrorKind::Internal | ErrorKind::Unknown => {
                "Something went wrong. Please try again.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, retry_after_ms: Option<u64>) -> Self {
        match status {
            404 => Self::new(ErrorKind::NotFound, "Resource not found"),
            429 => Self::new(ErrorKind::RateLimited, "Rate limited")
                .with_retry_after(retry_after_ms.unwrap_or(DEFAULT_RATE_LIMIT_RETRY_MS)),
            500..=599 => Self::new(ErrorKind::Server, format!("Server error {status}")),
            _ => Self::new(ErrorKind::Unknown, format!("Unexpected HTTP status {status}")),
        }
        .with_context("status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " ({internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
