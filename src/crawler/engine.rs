//! Crawl engine
//!
//! The engine is the single writer of the work queue, the resource table and
//! the data store. Fetches run on their own tasks and report back through a
//! channel; their results are applied on the engine's task, between dispatch
//! ticks, so nothing here needs a lock.

use crate::config::{self, Config};
use crate::crawler::events::{Event, EventBus, EventKind};
use crate::crawler::fetcher::{build_http_client, fetch_url, Response};
use crate::crawler::queue::WorkQueue;
use crate::plugins::{Pipeline, Plugin, PluginContext};
use crate::state::{Data, EngineState, FinalPayload, QueueEntry, Resource, ResourceTable};
use crate::url::UrlResolver;
use crate::{ConfigError, FetchError, ScrapeError, StateError, UrlError};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

/// What one dispatch tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The engine is not started
    Idle,
    /// The concurrency ceiling is reached
    Saturated,
    /// Fetches are in flight but nothing is left to dispatch
    Waiting,
    /// A fetch for this URL was issued
    Dispatched(String),
    /// The crawl reached quiescence
    Finished(FinalPayload),
}

/// How [`Crawler::run`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Paused(EngineState),
    Finished(FinalPayload),
}

/// Requests a pause of a running engine from another task
///
/// The request is picked up by [`Crawler::run`]. A request made while the
/// engine is not running is kept until the next run.
#[derive(Debug, Clone)]
pub struct PauseHandle {
    signal: Arc<Notify>,
}

impl PauseHandle {
    pub fn pause(&self) {
        self.signal.notify_one();
    }
}

/// Result of one fetch, tagged with the epoch it was issued in
#[derive(Debug)]
struct Completion {
    epoch: u64,
    url: String,
    result: Result<Response, FetchError>,
}

/// The crawl engine
pub struct Crawler {
    config: Config,
    resolver: UrlResolver,
    client: Client,
    queue: WorkQueue,
    resources: ResourceTable,
    data: Data,
    pending: usize,
    started: bool,
    // Bumped whenever in-flight fetches are abandoned
    epoch: u64,
    pipeline: Pipeline,
    events: EventBus,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    pause_signal: Arc<Notify>,
}

impl Crawler {
    /// Creates an engine with the seed URL enqueued
    ///
    /// The engine has no plugins and does nothing until [`Crawler::start`]
    /// is called.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration; it must name a base URL
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Engine ready to be started
    /// * `Err(ConfigError)` - The configuration is invalid
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config::validate(&config)?;

        let base_url = config
            .crawler
            .base_url
            .as_deref()
            .ok_or(ConfigError::MissingBaseUrl)?;
        let resolver = UrlResolver::new(base_url, config.crawler.strip_tracking_params)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        let seed = config.crawler.seed_url().ok_or(ConfigError::MissingBaseUrl)?;
        let seed = resolver
            .full_url(&seed)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        let client = build_http_client(&config)
            .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))?;

        let mut queue = WorkQueue::new();
        queue.enqueue(QueueEntry::new(seed, None));

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            resolver,
            client,
            queue,
            resources: ResourceTable::new(),
            data: Data::new(),
            pending: 0,
            started: false,
            epoch: 0,
            pipeline: Pipeline::new(),
            events: EventBus::new(),
            completions_tx,
            completions_rx,
            pause_signal: Arc::new(Notify::new()),
        })
    }

    /// Appends a plugin to the pipeline
    pub fn plugin<P>(&mut self, plugin: P) -> &mut Self
    where
        P: Plugin + 'static,
    {
        self.pipeline.push(Box::new(plugin));
        self
    }

    /// Appends several plugins, keeping their order
    pub fn plugins<I>(&mut self, plugins: I) -> &mut Self
    where
        I: IntoIterator<Item = Box<dyn Plugin>>,
    {
        for plugin in plugins {
            self.pipeline.push(plugin);
        }
        self
    }

    /// Registers a listener for one kind of event
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> &mut Self
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, listener);
        self
    }

    /// Enqueues `to`, resolved relative to `from` (or the base URL)
    pub fn add(&mut self, to: &str, from: Option<&str>) -> Result<usize, UrlError> {
        self.queue.add(&self.resolver, to, from)
    }

    pub fn pause_handle(&self) -> PauseHandle {
        PauseHandle {
            signal: Arc::clone(&self.pause_signal),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of fetches in flight
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Starts the engine, optionally replacing its state first
    ///
    /// Does nothing if the engine is already started. A supplied state
    /// replaces the queue, the resource table and the data store wholesale;
    /// resources it still marks pending are put back into the queue.
    pub fn start(&mut self, state: Option<EngineState>) -> Result<(), StateError> {
        if self.started {
            tracing::debug!("Crawler already started");
            return Ok(());
        }

        if let Some(state) = state {
            state.validate()?;
            tracing::info!(
                "Restoring state: {} queued, {} resources",
                state.queue.len(),
                state.resources.len()
            );

            self.queue = WorkQueue::from(state.queue);
            self.resources = state.resources;
            self.data = state.data;
            self.pending = 0;
            self.epoch += 1;
            self.reclaim_pending();
        }

        self.started = true;
        Ok(())
    }

    /// Runs one dispatch tick
    ///
    /// Issues at most one fetch. Must be called from within a tokio runtime
    /// when there is work to dispatch.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.started {
            return TickOutcome::Idle;
        }

        tracing::trace!("Tick: {} queued, {} pending", self.queue.len(), self.pending);
        self.events.emit(&Event::Interval {
            queued: self.queue.len(),
            pending: self.pending,
        });

        self.reconcile();

        if self.pending >= self.config.crawler.max_pending {
            return TickOutcome::Saturated;
        }

        if self.pending == 0 && self.queue.is_empty() {
            return TickOutcome::Finished(self.finish());
        }

        match self.queue.dequeue() {
            Some(entry) => TickOutcome::Dispatched(self.dispatch(entry)),
            None => TickOutcome::Waiting,
        }
    }

    /// Drives the engine until it finishes or is paused
    ///
    /// The first tick fires immediately, then once per configured interval.
    pub async fn run(&mut self) -> Result<Outcome, ScrapeError> {
        if !self.started {
            return Err(ScrapeError::NotStarted);
        }

        let mut ticker = tokio::time::interval(self.config.crawler.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let pause_signal = Arc::clone(&self.pause_signal);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let TickOutcome::Finished(payload) = self.tick() {
                        return Ok(Outcome::Finished(payload));
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.complete(completion);
                }
                _ = pause_signal.notified() => {
                    return Ok(Outcome::Paused(self.pause()));
                }
            }
        }
    }

    /// Stops the engine and snapshots its state
    ///
    /// Every resource still being fetched is removed from the table and its
    /// URL re-enqueued once per referrer, so it is fetched again after a
    /// resume. Results of those fetches are discarded when they arrive.
    pub fn pause(&mut self) -> EngineState {
        self.started = false;
        self.epoch += 1;
        self.reclaim_pending();
        self.pending = 0;

        let state = EngineState {
            queue: self.queue.to_vec(),
            resources: self.resources.clone(),
            data: self.data.clone(),
        };

        tracing::info!(
            "Paused with {} queued and {} resources",
            state.queue.len(),
            state.resources.len()
        );
        self.events.emit(&Event::Paused { state: &state });
        state
    }

    /// Merges queue entries for already known URLs into their resources
    fn reconcile(&mut self) {
        while let Some(head) = self.queue.peek() {
            if !self.resources.contains(&head.to) {
                break;
            }
            let Some(entry) = self.queue.dequeue() else {
                break;
            };
            if let Some(resource) = self.resources.get_mut(&entry.to) {
                resource.from.push(entry.from);
            }
        }
    }

    fn dispatch(&mut self, entry: QueueEntry) -> String {
        let url = entry.to;
        tracing::debug!("Fetching {}", url);

        self.resources
            .insert(Resource::pending(url.clone(), entry.from));
        self.pending += 1;

        let client = self.client.clone();
        let completions = self.completions_tx.clone();
        let timeout = self.config.crawler.request_timeout();
        let epoch = self.epoch;
        let target = url.clone();

        tokio::spawn(async move {
            let result = fetch_url(&client, &target, timeout).await;
            // The receiver only goes away with the engine
            let _ = completions.send(Completion {
                epoch,
                url: target,
                result,
            });
        });

        url
    }

    /// Applies the result of one fetch
    fn complete(&mut self, completion: Completion) {
        if !self.started || completion.epoch != self.epoch {
            tracing::debug!("Discarding stale result for {}", completion.url);
            return;
        }

        let Some(mut resource) = self.resources.remove(&completion.url) else {
            return;
        };
        if !resource.pending {
            self.resources.insert(resource);
            return;
        }

        self.pending = self.pending.saturating_sub(1);
        resource.pending = false;

        match completion.result {
            Err(error) => {
                tracing::warn!("{}", error);
                resource.error = Some(error.to_string());
                self.events.emit(&Event::ResourceError {
                    error: &error,
                    resource: &resource,
                });
            }
            Ok(response) => {
                let events = &self.events;
                let mut ctx = PluginContext::new(
                    &mut resource,
                    &response,
                    &self.resources,
                    &mut self.data,
                    &mut self.queue,
                    &self.resolver,
                );
                self.pipeline.run(&mut ctx, |error, resource, response| {
                    events.emit(&Event::PluginError {
                        error,
                        resource,
                        response,
                    });
                });
                drop(ctx);

                self.events.emit(&Event::ResourceProcessed {
                    resource: &resource,
                });
            }
        }

        self.resources.insert(resource);
    }

    fn reclaim_pending(&mut self) {
        for url in self.resources.pending_urls() {
            let Some(resource) = self.resources.remove(&url) else {
                continue;
            };
            tracing::debug!("Requeueing in-flight {}", url);
            for from in resource.from {
                self.queue.enqueue(QueueEntry::new(url.clone(), from));
            }
        }
    }

    fn finish(&mut self) -> FinalPayload {
        self.started = false;
        self.epoch += 1;

        let payload = FinalPayload {
            resources: self.resources.clone(),
            data: self.data.clone(),
        };

        tracing::info!("Crawl complete: {} resources", payload.resources.len());
        self.events.emit(&Event::End { payload: &payload });
        payload
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("base", &self.resolver.base().as_str())
            .field("started", &self.started)
            .field("pending", &self.pending)
            .field("queued", &self.queue.len())
            .field("resources", &self.resources.len())
            .field("plugins", &self.pipeline)
            .finish()
    }
}
