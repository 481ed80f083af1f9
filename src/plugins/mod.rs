//! Plugin pipeline
//!
//! Plugins run once per successfully fetched resource, strictly in
//! registration order. Each one may read and write the resource, enqueue new
//! URLs and write into the shared data store. A failing plugin is reported and
//! skipped; the rest of the pipeline and the crawl carry on.
//!
//! The reference plugins are:
//! - [`Status`]: records the status code and whether it is acceptable
//! - [`Parse`]: turns an acceptable HTML body into a [`Document`]
//! - [`Hrefs`]: follows `<a href>` links of internal pages
//! - [`Src`]: follows `<img src>` references of internal pages

mod hrefs;
mod parse;
mod src;
mod status;

pub use hrefs::Hrefs;
pub use parse::{Document, Parse};
pub use src::Src;
pub use status::{is_successful, Status, SUCCESSFUL_FIELD};

use crate::crawler::{Response, WorkQueue};
use crate::state::{Data, Resource, ResourceTable};
use crate::url::UrlResolver;
use crate::{PluginError, UrlError};
use std::panic::{self, AssertUnwindSafe};

/// A handler invoked once per fetched resource
///
/// While the pipeline runs, the resource being processed is held by the
/// context and is absent from [`PluginContext::resources`]. Read it through
/// [`PluginContext::resource`] instead.
pub trait Plugin: Send + Sync {
    /// Name used in logs and error reports
    fn name(&self) -> &str;

    /// Inspects the resource under `ctx`
    fn process(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError>;
}

/// What a plugin gets to see and touch while a resource is processed
///
/// The resource being processed is held outside the resource table until the
/// pipeline is done, so [`PluginContext::resources`] does not contain it.
pub struct PluginContext<'a> {
    resource: &'a mut Resource,
    response: &'a Response,
    resources: &'a ResourceTable,
    data: &'a mut Data,
    queue: &'a mut WorkQueue,
    resolver: &'a UrlResolver,
    document: Option<Document>,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(
        resource: &'a mut Resource,
        response: &'a Response,
        resources: &'a ResourceTable,
        data: &'a mut Data,
        queue: &'a mut WorkQueue,
        resolver: &'a UrlResolver,
    ) -> Self {
        Self {
            resource,
            response,
            resources,
            data,
            queue,
            resolver,
            document: None,
        }
    }

    pub fn resource(&self) -> &Resource {
        self.resource
    }

    pub fn resource_mut(&mut self) -> &mut Resource {
        self.resource
    }

    pub fn response(&self) -> &Response {
        self.response
    }

    /// Every other resource known to the engine
    pub fn resources(&self) -> &ResourceTable {
        self.resources
    }

    pub fn data(&self) -> &Data {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut Data {
        self.data
    }

    /// Enqueues `to`, resolved relative to `from` (or the base URL)
    ///
    /// Returns the new queue length.
    pub fn add(&mut self, to: &str, from: Option<&str>) -> Result<usize, UrlError> {
        self.queue.add(self.resolver, to, from)
    }

    pub fn is_external(&self, url: &str) -> bool {
        self.resolver.is_external(url)
    }

    pub fn full_url(&self, url: &str) -> Result<String, UrlError> {
        self.resolver.full_url(url)
    }

    /// Parsed document of the current resource, if a parser produced one
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn set_document(&mut self, document: Option<Document>) {
        self.document = document;
    }
}

/// Ordered list of registered plugins
#[derive(Default)]
pub struct Pipeline {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Runs every plugin against `ctx`, then drops internal fields
    ///
    /// `on_error` is called once per failing plugin. Returns the number of
    /// failures.
    pub fn run<F>(&self, ctx: &mut PluginContext<'_>, mut on_error: F) -> usize
    where
        F: FnMut(&PluginError, &Resource, &Response),
    {
        let mut failures = 0;

        for plugin in &self.plugins {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| plugin.process(ctx)));
            let result = outcome.unwrap_or_else(|payload| {
                Err(PluginError::Panicked {
                    plugin: plugin.name().to_string(),
                    message: panic_message(payload.as_ref()),
                })
            });

            if let Err(error) = result {
                failures += 1;
                tracing::warn!(
                    "Plugin {} failed on {}: {}",
                    plugin.name(),
                    ctx.resource.url,
                    error
                );
                on_error(&error, ctx.resource, ctx.response);
            }
        }

        ctx.document = None;
        ctx.resource.strip_internal();
        failures
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A plugin backed by a closure
pub struct FnPlugin<F> {
    name: String,
    f: F,
}

/// Wraps a closure as a named plugin
///
/// # Example
///
/// ```
/// use scrapeman::plugins::from_fn;
///
/// let plugin = from_fn("count", |ctx| {
///     let seen = ctx.data().get("count").and_then(|v| v.as_u64()).unwrap_or(0);
///     ctx.data_mut().insert("count".to_string(), (seen + 1).into());
///     Ok(())
/// });
/// # let _ = plugin;
/// ```
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnPlugin<F>
where
    F: Fn(&mut PluginContext<'_>) -> Result<(), PluginError> + Send + Sync,
{
    FnPlugin {
        name: name.into(),
        f,
    }
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&mut PluginContext<'_>) -> Result<(), PluginError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        (self.f)(ctx)
    }
}

/// The four reference plugins in their intended order
pub fn core() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(Status::default()),
        Box::new(Parse),
        Box::new(Hrefs),
        Box::new(Src),
    ]
}
