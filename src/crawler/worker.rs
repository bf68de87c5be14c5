//! Fetcher worker loop
//!
//! Each worker repeatedly takes a task from the frontier and carries it to a
//! terminal `FetchOutcome`:
//!
//! 1. Check robots.txt (Disallowed ends the task without a request)
//! 2. Reserve a politeness slot for the host and wait for it
//! 3. Fetch, retrying transient failures with exponential backoff
//! 4. Extract links from HTML and push in-scope children at depth + 1
//! 5. Record the outcome with the aggregator and the sink
//!
//! The task's in-flight slot is released once the outcome is recorded, or when
//! the task unwinds.
//!
//! Waits before a request is sent observe the `drain` token. A request on the
//! wire observes only `hard_stop`, so it can finish during the grace period.

use crate::config::ScopeConfig;
use crate::crawler::backoff::ExponentialBackoff;
use crate::crawler::fetcher::{HttpFetcher, HttpResponse};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::LinkExtractor;
use crate::crawler::politeness::PolitenessRegistry;
use crate::output::{ResultSink, StatsAggregator};
use crate::robots::{RobotsCache, RobotsVerdict};
use crate::state::{CrawlTask, FetchOutcome};
use crate::url::{canonicalize, classify_host, host_key};
use crate::TaskError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Per-run settings every worker reads
#[derive(Debug, Clone)]
pub(crate) struct WorkerSettings {
    pub fetch_timeout: Duration,
    pub min_host_delay: Duration,
    pub max_retries: u32,
    pub backoff: ExponentialBackoff,
    pub scope: ScopeConfig,
}

/// Everything a worker shares with the rest of the run
pub(crate) struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub politeness: Arc<PolitenessRegistry>,
    pub robots: Option<Arc<RobotsCache>>,
    pub fetcher: Arc<dyn HttpFetcher>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub sink: Arc<dyn ResultSink>,
    pub stats: Arc<StatsAggregator>,
    pub settings: WorkerSettings,
    pub drain: CancellationToken,
    pub hard_stop: CancellationToken,
}

/// Releases a popped task's in-flight slot, also when processing panics
struct InFlight<'a>(&'a Frontier);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.notify_in_flight(-1);
    }
}

/// How a pre-request wait ended
enum Wait {
    Elapsed,
    Cancelled,
}

impl WorkerContext {
    /// Runs one worker until the frontier stops handing out tasks
    pub(crate) async fn run(self: Arc<Self>, id: usize) {
        debug!("Worker {} started", id);

        while let Some(task) = self.frontier.pop(&self.drain).await {
            let _in_flight = InFlight(&self.frontier);
            self.stats.record_dispatch();
            debug!("Worker {} processing {} (depth {})", id, task.url, task.depth);

            let outcome = self.process(task).await;

            self.stats.record(&outcome);
            self.sink.write(&outcome);
        }

        debug!("Worker {} exiting", id);
    }

    async fn process(&self, task: CrawlTask) -> FetchOutcome {
        let started = Instant::now();

        if let Some(robots) = &self.robots {
            let verdict = tokio::select! {
                biased;
                _ = self.drain.cancelled() => {
                    return FetchOutcome::cancelled(task, 0, started.elapsed());
                }
                verdict = robots.is_allowed(&task.url) => verdict,
            };

            match verdict {
                RobotsVerdict::Disallowed => {
                    debug!("robots.txt disallows {}", task.url);
                    return FetchOutcome::disallowed(task);
                }
                RobotsVerdict::FailOpen(_) => self.stats.record_robots_failure(),
                RobotsVerdict::Allowed => {}
            }
        }

        let host = host_key(&task.url).unwrap_or_default();
        let delay = self.host_delay(&task);

        let mut attempts = 0u32;
        let response = loop {
            if let Wait::Cancelled = self.polite_wait(&host, delay).await {
                return FetchOutcome::cancelled(task, attempts, started.elapsed());
            }

            attempts += 1;
            let result = tokio::select! {
                biased;
                _ = self.hard_stop.cancelled() => {
                    return FetchOutcome::cancelled(task, attempts, started.elapsed());
                }
                result = self.fetcher.fetch(&task.url, self.settings.fetch_timeout) => result,
            };

            let error = match result {
                Ok(response) if response.is_success() => break response,
                Ok(response) => TaskError::HttpStatus {
                    url: task.url.to_string(),
                    status: response.status,
                },
                Err(e) => e,
            };

            if !error.is_retryable() || attempts > self.settings.max_retries {
                debug!("Giving up on {} after {} attempt(s): {}", task.url, attempts, error);
                return FetchOutcome::failed(task, error, attempts, started.elapsed());
            }

            let backoff = self.settings.backoff.delay(attempts - 1);
            debug!("Retrying {} in {:?}: {}", task.url, backoff, error);
            self.stats.record_retry();

            if let Wait::Cancelled = self.sleep_unless_draining(backoff).await {
                return FetchOutcome::cancelled(task, attempts, started.elapsed());
            }
        };

        let links = self.follow_links(&task, &response);

        FetchOutcome::fetched(
            task,
            response.status,
            response.body.len() as u64,
            links,
            attempts,
            started.elapsed(),
        )
    }

    /// Effective spacing for the task's host: the configured minimum, raised
    /// to the robots.txt Crawl-delay when that is longer
    fn host_delay(&self, task: &CrawlTask) -> Duration {
        let crawl_delay = self
            .robots
            .as_ref()
            .and_then(|robots| robots.crawl_delay(&task.url))
            .unwrap_or_default();

        self.settings.min_host_delay.max(crawl_delay)
    }

    async fn polite_wait(&self, host: &str, delay: Duration) -> Wait {
        let wait = self.politeness.authorize(host, delay);
        if wait.is_zero() {
            return Wait::Elapsed;
        }
        debug!("Waiting {:?} before contacting {}", wait, host);
        self.sleep_unless_draining(wait).await
    }

    async fn sleep_unless_draining(&self, duration: Duration) -> Wait {
        tokio::select! {
            biased;
            _ = self.drain.cancelled() => Wait::Cancelled,
            _ = tokio::time::sleep(duration) => Wait::Elapsed,
        }
    }

    /// Extracts links from an HTML response and queues the in-scope ones
    ///
    /// Returns the links as extracted. Only links accepted by the frontier
    /// count towards `links_discovered`.
    fn follow_links(&self, task: &CrawlTask, response: &HttpResponse) -> Vec<String> {
        if !response.is_html() {
            return Vec::new();
        }

        let links = self
            .extractor
            .extract_links(&response.body, &response.final_url);

        if task.depth >= self.frontier.max_depth() {
            return links;
        }

        let mut accepted = 0u64;
        for link in &links {
            let url = match canonicalize(link, Some(&response.final_url)) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Dropping link {}: {}", link, e);
                    continue;
                }
            };

            let in_scope = url
                .host_str()
                .map(|host| classify_host(host, &self.settings.scope).should_crawl())
                .unwrap_or(false);
            if !in_scope {
                debug!("Dropping out-of-scope link {}", url);
                continue;
            }

            if self.frontier.push(task.child(url)) {
                accepted += 1;
            }
        }

        if accepted > 0 {
            self.stats.record_links_discovered(accepted);
        }
        links
    }
}
