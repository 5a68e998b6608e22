//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key except `seeds` has a default, so the smallest useful file is:
//!
//! ```toml
//! seeds = ["https://example.com/"]
//! ```
//!
//! # Example
//!
//! ```no_run
//! use webcrawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlConfig, CrawlerConfig, ExtractionConfig, OutputConfig, DEFAULT_EXCLUSIONS, DEFAULT_TAGS,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
