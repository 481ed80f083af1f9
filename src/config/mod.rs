//! Configuration module for Scrapeman
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every table is optional; only the base URL has no usable default.
//!
//! # Example
//!
//! ```no_run
//! use scrapeman::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrapeman.toml")).unwrap();
//! println!("Crawler will keep at most {} requests open", config.crawler.max_pending);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config, read_config};
pub use validation::validate;
