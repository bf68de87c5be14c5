//! Configuration module for Polite-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so the binary can also run from flags alone.
//!
//! # Example
//!
//! ```no_run
//! use polite_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ScopeConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_content, load_config, load_config_with_hash, read_config};
pub use validation::{validate, MAX_DEPTH_LIMIT, MAX_WORKERS};
