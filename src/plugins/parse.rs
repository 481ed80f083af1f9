//! HTML parsing
//!
//! Wraps `scraper`'s forgiving HTML5 parser. Malformed markup is tolerated;
//! only a body that is not text at all is rejected.

use crate::crawler::Response;
use crate::plugins::{is_successful, Plugin, PluginContext};
use crate::{ParseError, PluginError};
use scraper::{Html, Selector};

/// A queryable HTML document
#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML text
    ///
    /// # Example
    ///
    /// ```
    /// use scrapeman::plugins::Document;
    ///
    /// let doc = Document::parse(r#"<a href="/page">Link</a>"#);
    /// assert_eq!(doc.attribute_values("a", "href").unwrap(), vec!["/page".to_string()]);
    /// ```
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Parses a response body
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected, so pages in
    /// legacy encodings still yield their markup. A body containing NUL bytes
    /// is binary content and is refused.
    pub fn from_response(response: &Response) -> Result<Self, ParseError> {
        if response.body.contains(&0) {
            return Err(ParseError::Binary);
        }
        Ok(Self::parse(&response.text()))
    }

    /// The underlying `scraper` document
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Values of `attribute` on every element matching `selector`, in document order
    ///
    /// Elements without the attribute are skipped.
    pub fn attribute_values(&self, selector: &str, attribute: &str) -> Result<Vec<String>, ParseError> {
        let parsed =
            Selector::parse(selector).map_err(|_| ParseError::Selector(selector.to_string()))?;

        Ok(self
            .html
            .select(&parsed)
            .filter_map(|element| element.value().attr(attribute))
            .map(str::to_string)
            .collect())
    }
}

/// Produces a [`Document`] for successful HTML responses
#[derive(Debug, Clone, Copy, Default)]
pub struct Parse;

impl Plugin for Parse {
    fn name(&self) -> &str {
        "parse"
    }

    fn process(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        if ctx.resource().status_code.is_some() && !is_successful(ctx.resource()) {
            return Ok(());
        }
        if !ctx.response().is_html() {
            return Ok(());
        }

        let parsed = Document::from_response(ctx.response());
        match parsed {
            Ok(document) => ctx.set_document(Some(document)),
            Err(e) => {
                tracing::debug!("Failed to parse HTML for {}: {}", ctx.resource().url, e);
                ctx.set_document(None);
                ctx.resource_mut().error = Some(e.to_string());
            }
        }

        Ok(())
    }
}
