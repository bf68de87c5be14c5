//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt per host. Matching of
//! Allow/Disallow rules is done by the robotstxt crate.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache, RobotsVerdict};
pub use parser::{RobotsRules, MAX_CRAWL_DELAY};
