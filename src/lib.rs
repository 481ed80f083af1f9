//! Scrapeman: a polite, resumable, plugin-extensible web crawler
//!
//! This crate implements an interval-driven crawl engine that fetches at most one
//! new resource per tick, hands every fetched resource to an ordered plugin
//! pipeline, and can be paused into a serializable snapshot and resumed later
//! without fetching anything twice.

pub mod config;
pub mod crawler;
pub mod output;
pub mod plugins;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Scrapeman operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Crawler has not been started")]
    NotStarted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("You must provide a base URL")]
    MissingBaseUrl,

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {message}")]
    Parse { url: String, message: String },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Transport failures; the display string is what gets recorded on a resource
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("HTTP error for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Errors raised while saving, loading or restoring engine state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed state document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid state: {0}")]
    Invalid(String),
}

/// HTML document errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Response body is binary, not HTML")]
    Binary,

    #[error("Invalid selector '{0}'")]
    Selector(String),
}

/// Errors reported by a single plugin for a single resource
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin '{plugin}' failed: {message}")]
    Failed { plugin: String, message: String },

    #[error("Plugin '{plugin}' panicked: {message}")]
    Panicked { plugin: String, message: String },

    #[error("Field '{0}' is reserved and cannot be set by plugins")]
    ReservedField(String),

    #[error(transparent)]
    Url(#[from] UrlError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl PluginError {
    /// Builds a generic failure attributed to `plugin`
    pub fn failed(plugin: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Failed {
            plugin: plugin.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for Scrapeman operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{crawl, Crawler, Event, EventKind, Outcome, PauseHandle, TickOutcome};
pub use crate::plugins::{Plugin, PluginContext};
pub use crate::state::{EngineState, FinalPayload, QueueEntry, Resource, ResourceTable};
pub use crate::url::UrlResolver;
