//! State module for tracking crawl progress
//!
//! This module provides the data the engine owns and hands over on pause.
//!
//! # Components
//!
//! - `Resource`: One fetched or pending-to-fetch URL and its accumulated metadata
//! - `ResourceTable`: The deduplication ledger, keyed by canonical URL
//! - `EngineState`: Queue, resources and auxiliary data of a paused crawl
//! - `FinalPayload`: What a finished crawl produces

mod resource;
mod snapshot;

/// Auxiliary key-value store shared by the plugins of one engine
pub type Data = serde_json::Map<String, serde_json::Value>;

// Re-export main types
pub use resource::{is_internal_field, Resource, ResourceTable, RESERVED_FIELDS};
pub use snapshot::{EngineState, FinalPayload, QueueEntry};
