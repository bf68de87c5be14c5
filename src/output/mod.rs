//! Output module for crawl results
//!
//! This module handles:
//! - Aggregating run statistics
//! - Forwarding task outcomes to result sinks
//! - Generating markdown summaries of finished runs

mod markdown;
mod sink;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sink::{NullSink, ResultSink, SqliteSink};
pub use stats::{print_statistics, CrawlStats, StatsAggregator};
