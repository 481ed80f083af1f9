//! Fixture site shared by the integration tests

use scrapeman::config::Config;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A site under test plus a second server standing in for another origin
pub struct Site {
    pub server: MockServer,
    pub external: MockServer,
}

impl Site {
    pub fn base(&self) -> String {
        self.server.uri()
    }

    /// Absolute URL of `path` on the site
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Every resource a complete crawl should end up with, sorted
    pub fn expected_urls(&self) -> Vec<String> {
        let mut urls = vec![
            self.url("/"),
            self.url("/blog.html"),
            self.url("/images/logo.png"),
            self.url("/missing.html"),
            self.url("/relative-test/"),
            self.url("/relative-test/should-not-be-root.html"),
            format!("{}/", self.external.uri()),
        ];
        urls.sort();
        urls
    }
}

/// Starts the fixture site; every response is held back for `delay`
pub async fn fixture_site(delay: Duration) -> Site {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    let pages = [
        (
            "/",
            format!(
                r##"<html><head><title>Home</title></head><body>
                <a href="/blog.html">Blog</a>
                <a href="relative-test/">Relative</a>
                <a href="/missing.html">Gone</a>
                <a href="{external}/">Elsewhere</a>
                <a href="mailto:owner@example.com">Mail</a>
                <a href="tel:+15550100">Call</a>
                <a href="javascript:void(0)">Nothing</a>
                <a href="#top">Top</a>
                <img src="/images/logo.png">
                </body></html>"##,
                external = external.uri()
            ),
        ),
        (
            "/blog.html",
            r#"<html><body>
            <a href="/">Home</a>
            <a href="/blog.html#comments">Comments</a>
            <img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">
            <img src="images/logo.png">
            </body></html>"#
                .to_string(),
        ),
        (
            "/relative-test/",
            r#"<html><body>
            <a href="should-not-be-root.html">Nested</a>
            <a href="../blog.html?utm_source=feed">Blog</a>
            </body></html>"#
                .to_string(),
        ),
        (
            "/relative-test/should-not-be-root.html",
            r#"<html><body><a href="/">Home</a></body></html>"#.to_string(),
        ),
    ];

    for (page, body) in pages {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "text/html; charset=utf-8")
                    .set_delay(delay),
            )
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/images/logo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png")
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing.html"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(r#"<a href="/never.html">never</a>"#, "text/html")
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/deeper.html">deeper</a>"#, "text/html")
                .set_delay(delay),
        )
        .mount(&external)
        .await;

    Site { server, external }
}

/// Configuration for crawling `base_url` quickly
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::new(base_url);
    config.crawler.interval = 10;
    config.crawler.max_pending = 5;
    config.crawler.request_timeout = 2000;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}
