use crate::plugins::{Plugin, PluginContext};
use crate::PluginError;

/// Schemes and forms of `href` that never name a crawlable resource
const SKIPPED_PREFIXES: &[&str] = &["tel:", "mailto:", "javascript:", "#"];

/// Follows every `<a href>` of internal pages
#[derive(Debug, Clone, Copy, Default)]
pub struct Hrefs;

impl Plugin for Hrefs {
    fn name(&self) -> &str {
        "hrefs"
    }

    fn process(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        let Some(document) = ctx.document() else {
            return Ok(());
        };
        if ctx.is_external(&ctx.resource().url) {
            return Ok(());
        }

        let hrefs = document.attribute_values("a", "href")?;
        let from = ctx.resource().url.clone();

        for href in hrefs.iter().filter(|href| is_valid_href(href)) {
            if let Err(e) = ctx.add(href, Some(&from)) {
                tracing::debug!("Skipping link {} on {}: {}", href, from, e);
            }
        }

        Ok(())
    }
}

fn is_valid_href(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }
    let lower = href.to_ascii_lowercase();
    !SKIPPED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::Harness;
    use crate::plugins::{Parse, Status};

    fn run(harness: &mut Harness) {
        let mut ctx = harness.context();
        Status::default().process(&mut ctx).unwrap();
        Parse.process(&mut ctx).unwrap();
        Hrefs.process(&mut ctx).unwrap();
    }

    #[test]
    fn test_follows_links_relative_to_page() {
        let mut harness = Harness::html(
            "http://x/relative-test/",
            r#"<a href="should-not-be-root.html">rel</a>
               <a href="/blog.html">abs path</a>
               <a href="http://other/">external</a>"#,
        );
        run(&mut harness);

        let from = Some("http://x/relative-test/".to_string());
        assert_eq!(
            harness.queued(),
            vec![
                ("http://x/relative-test/should-not-be-root.html".to_string(), from.clone()),
                ("http://x/blog.html".to_string(), from.clone()),
                ("http://other/".to_string(), from),
            ]
        );
    }

    #[test]
    fn test_filters_special_links() {
        let mut harness = Harness::html(
            "http://x/",
            r##"<a href="tel:+123">call</a>
                <a href="mailto:a@x">mail</a>
                <a href="JavaScript:void(0)">js</a>
                <a href="#top">top</a>
                <a href="">empty</a>
                <a>none</a>
                <a href="/ok.html">ok</a>"##,
        );
        run(&mut harness);

        assert_eq!(
            harness.queued(),
            vec![("http://x/ok.html".to_string(), Some("http://x/".to_string()))]
        );
    }

    #[test]
    fn test_external_pages_are_not_expanded() {
        let mut harness = Harness::html("http://other/", r#"<a href="/more">more</a>"#);
        run(&mut harness);
        assert!(harness.queued().is_empty());
    }

    #[test]
    fn test_without_document_does_nothing() {
        let mut harness = Harness::new("http://x/", 500, "text/html", r#"<a href="/a">a</a>"#);
        run(&mut harness);
        assert!(harness.queued().is_empty());
    }
}
