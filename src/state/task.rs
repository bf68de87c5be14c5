use chrono::{DateTime, Utc};
use url::Url;

/// A URL waiting to be fetched
///
/// Tasks are immutable once created: a seed or a discovered link becomes a
/// task, the frontier holds it, and a worker consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Canonical URL to fetch
    pub url: Url,

    /// Link distance from the seed (seeds are depth 0)
    pub depth: u32,

    /// When the link was discovered or the seed supplied
    pub discovered_at: DateTime<Utc>,

    /// The page the link was found on (None for seeds)
    pub source_url: Option<Url>,
}

impl CrawlTask {
    /// Creates a depth-0 task for a seed URL
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            discovered_at: Utc::now(),
            source_url: None,
        }
    }

    /// Creates a task for a link discovered on this task's page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            discovered_at: Utc::now(),
            source_url: Some(self.url.clone()),
        }
    }
}
