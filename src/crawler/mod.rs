//! Crawler module: the engine and its collaborators
//!
//! This module contains:
//! - The work queue of pending fetch requests
//! - The interval-driven dispatch engine with pause and resume
//! - HTTP fetching
//! - The event surface observed by callers

mod engine;
mod events;
mod fetcher;
mod queue;

pub use engine::{Crawler, Outcome, PauseHandle, TickOutcome};
pub use events::{Event, EventBus, EventKind};
pub use fetcher::{build_http_client, fetch_url, Response};
pub use queue::WorkQueue;

use crate::config::Config;
use crate::plugins;
use crate::ScrapeError;

/// Runs a complete crawl with the reference plugins
///
/// This is the simplest entry point: the engine is seeded from `config`,
/// started fresh and driven until the crawl ends.
///
/// # Returns
///
/// * `Ok(Outcome)` - How the crawl ended
/// * `Err(ScrapeError)` - The engine could not be built or started
pub async fn crawl(config: Config) -> Result<Outcome, ScrapeError> {
    let mut crawler = Crawler::new(config)?;
    crawler.plugins(plugins::core());
    crawler.start(None)?;
    crawler.run().await
}
