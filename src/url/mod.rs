//! URL handling module for Scrapeman
//!
//! Turns the relative and absolute links plugins discover into canonical
//! absolute URLs, which are the keys of the resource table, and decides which
//! of them lie outside the crawl.

mod normalize;

pub use normalize::normalize_url;

use crate::UrlError;
use url::Url;

/// Resolves URLs against the crawl's base URL
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base: Url,
    strip_tracking: bool,
}

impl UrlResolver {
    /// Creates a resolver for the given base URL
    ///
    /// # Arguments
    ///
    /// * `base_url` - Absolute http(s) URL every crawled resource should start with
    /// * `strip_tracking` - Whether tracking query parameters are dropped
    pub fn new(base_url: &str, strip_tracking: bool) -> Result<Self, UrlError> {
        let base = normalize_url(parse(base_url)?, strip_tracking)?;
        Ok(Self {
            base,
            strip_tracking,
        })
    }

    /// The canonical base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Canonicalizes `url`, resolving it relative to `from` if given and to the
    /// base otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use scrapeman::url::UrlResolver;
    ///
    /// let resolver = UrlResolver::new("http://localhost:8000", true).unwrap();
    /// let url = resolver
    ///     .resolve("should-not-be-root.html", Some("http://localhost:8000/relative-test/"))
    ///     .unwrap();
    /// assert_eq!(url.as_str(), "http://localhost:8000/relative-test/should-not-be-root.html");
    /// ```
    pub fn resolve(&self, url: &str, from: Option<&str>) -> Result<Url, UrlError> {
        let referrer = match from {
            Some(from) => self.resolve(from, None)?,
            None => self.base.clone(),
        };

        let joined = referrer.join(url.trim()).map_err(|e| UrlError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        normalize_url(joined, self.strip_tracking)
    }

    /// Canonical absolute form of `url`, resolved against the base
    pub fn full_url(&self, url: &str) -> Result<String, UrlError> {
        self.resolve(url, None).map(String::from)
    }

    /// Whether `url` falls outside the crawl's base URL
    ///
    /// URLs that cannot be canonicalized are treated as external.
    pub fn is_external(&self, url: &str) -> bool {
        match self.full_url(url) {
            Ok(full) => !full.starts_with(self.base.as_str()),
            Err(_) => true,
        }
    }
}

fn parse(url: &str) -> Result<Url, UrlError> {
    Url::parse(url.trim()).map_err(|e| UrlError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}
