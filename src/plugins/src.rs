use crate::plugins::{Plugin, PluginContext};
use crate::PluginError;

/// Follows every `<img src>` of internal pages
#[derive(Debug, Clone, Copy, Default)]
pub struct Src;

impl Plugin for Src {
    fn name(&self) -> &str {
        "src"
    }

    fn process(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        let Some(document) = ctx.document() else {
            return Ok(());
        };
        if ctx.is_external(&ctx.resource().url) {
            return Ok(());
        }

        let sources = document.attribute_values("img", "src")?;
        let from = ctx.resource().url.clone();

        for src in sources.iter().filter(|src| is_valid_src(src)) {
            if let Err(e) = ctx.add(src, Some(&from)) {
                tracing::debug!("Skipping image {} on {}: {}", src, from, e);
            }
        }

        Ok(())
    }
}

fn is_valid_src(src: &str) -> bool {
    let src = src.trim();
    !src.is_empty() && !src.to_ascii_lowercase().starts_with("data:")
}
