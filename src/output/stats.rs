//! Crawl statistics
//!
//! `StatsAggregator` is the only owner of the run's counters. Every update
//! happens under one lock, so a snapshot is always a consistent copy.

use crate::state::{FetchOutcome, PageState};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

/// Counters for one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    /// Tasks handed to a worker
    pub pages_dispatched: u64,

    /// Tasks that ended with a 2xx response
    pub pages_fetched: u64,

    /// Tasks that exhausted their attempts
    pub pages_failed: u64,

    /// Tasks abandoned because the crawl stopped
    pub pages_cancelled: u64,

    /// Tasks skipped because robots.txt disallows them
    pub pages_disallowed: u64,

    /// robots.txt fetches that failed and were treated as allow-all
    pub robots_failures: u64,

    /// Extra attempts beyond the first, across all tasks
    pub retries: u64,

    /// Body bytes of fetched pages
    pub bytes_downloaded: u64,

    /// URLs newly accepted into the frontier, seeds included
    pub links_discovered: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            pages_dispatched: 0,
            pages_fetched: 0,
            pages_failed: 0,
            pages_cancelled: 0,
            pages_disallowed: 0,
            robots_failures: 0,
            retries: 0,
            bytes_downloaded: 0,
            links_discovered: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Tasks that reached a terminal state
    pub fn pages_completed(&self) -> u64 {
        self.pages_fetched + self.pages_failed + self.pages_cancelled + self.pages_disallowed
    }

    /// Count for one terminal state
    pub fn count_for(&self, state: PageState) -> u64 {
        match state {
            PageState::Fetched => self.pages_fetched,
            PageState::Failed => self.pages_failed,
            PageState::Disallowed => self.pages_disallowed,
            PageState::Cancelled => self.pages_cancelled,
        }
    }

    /// Wall-clock duration of the run, up to now if it is still going
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Percentage of processed pages that were fetched successfully
    pub fn success_rate(&self) -> f64 {
        let processed = self.pages_fetched + self.pages_failed;
        if processed == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / processed as f64) * 100.0
        }
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes updates to the run's `CrawlStats`
#[derive(Debug, Default)]
pub struct StatsAggregator {
    stats: Mutex<CrawlStats>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a task outcome
    pub fn record(&self, outcome: &FetchOutcome) {
        let mut stats = self.lock();
        match outcome.state {
            PageState::Fetched => {
                stats.pages_fetched += 1;
                stats.bytes_downloaded += outcome.byte_size;
            }
            PageState::Failed => stats.pages_failed += 1,
            PageState::Disallowed => stats.pages_disallowed += 1,
            PageState::Cancelled => stats.pages_cancelled += 1,
        }
    }

    pub fn record_dispatch(&self) {
        self.lock().pages_dispatched += 1;
    }

    pub fn record_links_discovered(&self, count: u64) {
        self.lock().links_discovered += count;
    }

    pub fn record_robots_failure(&self) {
        self.lock().robots_failures += 1;
    }

    pub fn record_retry(&self) {
        self.lock().retries += 1;
    }

    /// Stamps the finish time; later calls keep the first stamp
    pub fn finish(&self) {
        let mut stats = self.lock();
        if stats.finished_at.is_none() {
            stats.finished_at = Some(Utc::now());
        }
    }

    /// Returns a point-in-time copy of the counters
    pub fn snapshot(&self) -> CrawlStats {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, CrawlStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    println!("  Duration: {}s", stats.elapsed().num_seconds());
    println!("  Links discovered: {}", stats.links_discovered);
    println!("  Pages dispatched: {}", stats.pages_dispatched);
    println!();

    println!("Pages by State:");
    let total = stats.pages_completed();
    for state in PageState::all_states() {
        let count = stats.count_for(state);
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    println!("Network:");
    println!("  Bytes downloaded: {}", stats.bytes_downloaded);
    println!("  Retries: {}", stats.retries);
    println!("  robots.txt failures: {}", stats.robots_failures);
    println!();

    println!("Success Rate: {:.1}%", stats.success_rate());
}
