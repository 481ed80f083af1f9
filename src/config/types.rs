use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Scrapeman
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Creates a configuration with default settings for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig {
                base_url: Some(base_url.into()),
                ..CrawlerConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Root of the crawl; anything outside it is external
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Path appended to the base URL to form the seed
    #[serde(rename = "initial-path")]
    pub initial_path: String,

    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-pending")]
    pub max_pending: usize,

    /// Dispatch loop period (milliseconds)
    pub interval: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Maximum number of redirects the transport follows
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Idle connections kept per host by the transport
    #[serde(rename = "max-idle-connections")]
    pub max_idle_connections: usize,

    /// Drop utm_* and similar tracking parameters when canonicalizing URLs
    #[serde(rename = "strip-tracking-params")]
    pub strip_tracking_params: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            initial_path: String::new(),
            max_pending: 5,
            interval: 500,
            request_timeout: 5000,
            max_redirects: 10,
            max_idle_connections: 10,
            strip_tracking_params: true,
        }
    }
}

impl CrawlerConfig {
    /// Dispatch loop period
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    /// The seed URL as configured, before canonicalization
    pub fn seed_url(&self) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base, self.initial_path))
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where a paused crawl's snapshot is written and resumed from
    #[serde(rename = "pause-path")]
    pub pause_path: String,

    /// Where the final payload is written when the crawl ends
    #[serde(rename = "final-path")]
    pub final_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pause_path: "scrapeman-pause.json".to_string(),
            final_path: "scrapeman-final.json".to_string(),
        }
    }
}
