//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier and the fixed worker pool
//! - HTTP fetching with retry and exponential backoff
//! - HTML parsing and link extraction
//! - Per-host request spacing
//! - Run lifecycle and cooperative cancellation

mod backoff;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod politeness;
mod shutdown;
mod worker;

pub use backoff::{ExponentialBackoff, MAX_BACKOFF};
pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{build_http_client, HttpFetcher, HttpResponse, ReqwestFetcher, MAX_REDIRECTS};
pub use frontier::Frontier;
pub use parser::{HtmlLinkExtractor, LinkExtractor};
pub use politeness::PolitenessRegistry;
pub use shutdown::{CrawlState, ShutdownHandle, StopReason};

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl with the production collaborators
///
/// Outcomes are discarded; use `Coordinator::sink` to keep them.
///
/// # Arguments
///
/// * `config` - A validated crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished (for any stop reason)
/// * `Err(CrawlError)` - The run could not start
pub async fn crawl(config: Config) -> Result<CrawlReport, CrawlError> {
    Ok(Coordinator::new(config)?.run().await)
}
