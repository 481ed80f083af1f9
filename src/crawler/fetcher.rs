//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent, redirect bound
//!   and connection pool size
//! - GET requests with a per-request timeout
//! - Error classification
//!
//! Any HTTP status counts as a response; only transport failures are errors.

use crate::config::Config;
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

/// A fetched resource as seen by the plugin pipeline
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Response headers with lower-case names
    pub headers: HashMap<String, String>,
    /// Raw body
    pub body: Vec<u8>,
}

impl Response {
    /// Looks up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the Content-Type announces HTML
    pub fn is_html(&self) -> bool {
        self.content_type()
            .map_or(false, |ct| ct.contains("text/html"))
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .redirect(Policy::limited(config.crawler.max_redirects))
        .pool_max_idle_per_host(config.crawler.max_idle_connections)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `timeout` - Deadline for the whole request, body included
///
/// # Returns
///
/// The response for any HTTP status, or the transport failure
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> Result<Response, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();

    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in response.headers() {
        let Ok(value) = value.to_str() else {
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Body {
                url: url.to_string(),
                source: e,
            }
        }
    })?;

    Ok(Response {
        url: final_url,
        status_code,
        headers,
        body: body.to_vec(),
    })
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_redirect() {
        FetchError::RedirectLimit {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
