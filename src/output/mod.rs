//! Output module for crawl results
//!
//! The final payload and pause snapshots are written by the state module;
//! this module summarizes them for people.

pub mod stats;

pub use stats::{print_statistics, CrawlStatistics};
