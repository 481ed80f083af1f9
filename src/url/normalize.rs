use crate::UrlError;
use url::Url;

/// Tracking query parameters removed when `strip_tracking` is enabled
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Brings an absolute URL into the canonical form used as a resource key
///
/// # Normalization Steps
///
/// 1. Reject anything that is not http or https
/// 2. Reject URLs without a host
/// 3. Remove fragment (everything after #)
/// 4. Optionally remove tracking query parameters, keeping the order of the rest
/// 5. Remove empty query string (trailing ?)
///
/// Host lowercasing, default-port removal and dot-segment removal are already
/// performed by the `url` parser.
///
/// # Examples
///
/// ```
/// use scrapeman::url::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("HTTP://Example.COM:80/a/../page?utm_source=x#top").unwrap();
/// assert_eq!(normalize_url(url, true).unwrap().as_str(), "http://example.com/page");
/// ```
pub fn normalize_url(mut url: Url, strip_tracking: bool) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(url.to_string()));
    }

    url.set_fragment(None);

    if strip_tracking && url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
