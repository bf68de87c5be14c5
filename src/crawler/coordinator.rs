//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the run's components together and drives its lifecycle:
//! - Seeding the frontier
//! - Spawning exactly `workers` worker tasks
//! - Firing the drain signal on global timeout or stop request
//! - Enforcing the grace period and the final bounded join
//! - Producing the final `CrawlReport`

use crate::config::{validate, Config};
use crate::crawler::backoff::ExponentialBackoff;
use crate::crawler::fetcher::{HttpFetcher, ReqwestFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::politeness::PolitenessRegistry;
use crate::crawler::shutdown::{CrawlState, Shutdown, ShutdownHandle, StopReason};
use crate::crawler::worker::{WorkerContext, WorkerSettings};
use crate::output::{CrawlStats, NullSink, ResultSink, StatsAggregator};
use crate::robots::RobotsCache;
use crate::state::CrawlTask;
use crate::url::canonicalize;
use crate::CrawlError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Interval between progress log lines
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Final result of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub stats: CrawlStats,
    /// Always `Stopped` for a report returned by `Coordinator::run`
    pub state: CrawlState,
    pub stop_reason: StopReason,
}

/// Main crawler coordinator structure
///
/// One coordinator drives one run. The visited set, frontier, politeness and
/// robots state are created inside `run` and dropped with it.
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn HttpFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    sink: Arc<dyn ResultSink>,
    stats: Arc<StatsAggregator>,
    shutdown: Arc<Shutdown>,
}

impl Coordinator {
    /// Creates a coordinator with the production collaborators
    ///
    /// Uses a reqwest-backed fetcher, the HTML link extractor and a sink that
    /// discards outcomes.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration; it is validated here
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The configuration is invalid or the HTTP client
    ///   could not be built
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        validate(&config)?;
        let fetcher = ReqwestFetcher::from_config(&config.user_agent)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a coordinator around a custom HTTP collaborator
    ///
    /// Fails with `CrawlError::Config` if the configuration does not validate.
    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Result<Self, CrawlError> {
        validate(&config)?;
        Ok(Self {
            config: Arc::new(config),
            fetcher,
            extractor: Arc::new(HtmlLinkExtractor),
            sink: Arc::new(NullSink),
            stats: Arc::new(StatsAggregator::new()),
            shutdown: Arc::new(Shutdown::new()),
        })
    }

    /// Replaces the link extractor
    pub fn extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the result sink
    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns a handle that can stop the run from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.shutdown.clone())
    }

    /// Returns the run's live statistics, for snapshots while it is running
    pub fn stats(&self) -> Arc<StatsAggregator> {
        self.stats.clone()
    }

    /// Runs the crawl to completion
    ///
    /// Per-task failures never abort the run; they show up in the returned
    /// statistics and in the sink. The run ends when the frontier is exhausted
    /// or, after a stop, when the grace period and final join are over.
    pub async fn run(self) -> CrawlReport {
        let crawler = &self.config.crawler;
        let stats = self.stats.clone();
        let frontier = Arc::new(Frontier::new(crawler.max_depth));

        let robots = crawler.respect_robots.then(|| {
            Arc::new(RobotsCache::new(
                self.fetcher.clone(),
                self.config.user_agent.crawler_name.clone(),
                crawler.robots_ttl(),
                crawler.fetch_timeout(),
            ))
        });

        self.seed_frontier(&frontier, &stats);

        let context = Arc::new(WorkerContext {
            frontier: frontier.clone(),
            politeness: Arc::new(PolitenessRegistry::new()),
            robots,
            fetcher: self.fetcher.clone(),
            extractor: self.extractor.clone(),
            sink: self.sink.clone(),
            stats: stats.clone(),
            settings: WorkerSettings {
                fetch_timeout: crawler.fetch_timeout(),
                min_host_delay: crawler.min_host_delay(),
                max_retries: crawler.max_retries,
                backoff: ExponentialBackoff::from_base(Duration::from_millis(
                    crawler.retry_base_delay_ms,
                )),
                scope: self.config.scope.clone(),
            },
            drain: self.shutdown.drain_token().clone(),
            hard_stop: self.shutdown.hard_stop_token().clone(),
        });

        info!(
            "Starting crawl: {} seed(s), {} worker(s), max depth {}",
            frontier.len(),
            crawler.workers,
            crawler.max_depth
        );

        let timer = crawler.global_timeout().map(|limit| {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => {
                        info!("Global timeout of {:?} reached", limit);
                        shutdown.begin_drain(StopReason::Timeout);
                    }
                    _ = shutdown.drain_token().cancelled() => {}
                }
            })
        });
        let progress = tokio::spawn(log_progress(stats.clone(), frontier.clone()));

        let mut workers = JoinSet::new();
        for id in 0..crawler.workers as usize {
            workers.spawn(context.clone().run(id));
        }
        drop(context);

        let drained = self.wait_for_workers(&mut workers).await;
        if drained {
            frontier.close();
            self.finish_draining(&mut workers, &frontier).await;
        }

        if let Some(timer) = timer {
            timer.abort();
        }
        progress.abort();

        let stop_reason = self.shutdown.finish();
        stats.finish();
        let snapshot = stats.snapshot();

        let sink = self.sink.clone();
        let closing = snapshot.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || sink.close(&closing, stop_reason)).await
        {
            error!("Result sink failed to close: {}", e);
        }

        info!(
            "Crawl stopped ({}): {} fetched, {} failed, {} cancelled, {} disallowed",
            stop_reason,
            snapshot.pages_fetched,
            snapshot.pages_failed,
            snapshot.pages_cancelled,
            snapshot.pages_disallowed
        );

        CrawlReport {
            stats: snapshot,
            state: self.shutdown.state(),
            stop_reason,
        }
    }

    fn seed_frontier(&self, frontier: &Frontier, stats: &StatsAggregator) {
        let mut accepted = 0u64;
        for seed in &self.config.seeds {
            match canonicalize(seed, None) {
                Ok(url) => {
                    if frontier.push(CrawlTask::seed(url)) {
                        accepted += 1;
                    } else {
                        debug!("Duplicate seed {}", seed);
                    }
                }
                Err(e) => warn!("Skipping seed {}: {}", seed, e),
            }
        }
        stats.record_links_discovered(accepted);
    }

    /// Waits until every worker exits or the drain signal fires
    ///
    /// Returns true if draining started before the workers finished.
    async fn wait_for_workers(&self, workers: &mut JoinSet<()>) -> bool {
        let drain = self.shutdown.drain_token();
        loop {
            tokio::select! {
                biased;
                joined = workers.join_next() => match joined {
                    Some(result) => log_join_error(result),
                    None => return false,
                },
                _ = drain.cancelled() => return !workers.is_empty(),
            }
        }
    }

    /// Gives in-flight fetches the grace period, then cancels them
    async fn finish_draining(&self, workers: &mut JoinSet<()>, frontier: &Frontier) {
        let grace = self.config.crawler.grace_period();
        info!(
            "Waiting up to {:?} for {} in-flight task(s); {} queued task(s) will not be dispatched",
            grace,
            frontier.in_flight(),
            frontier.len()
        );

        let hard_stop = self.shutdown.hard_stop_token();
        let graceful = tokio::select! {
            _ = join_all(workers) => true,
            _ = tokio::time::sleep(grace) => false,
            _ = hard_stop.cancelled() => false,
        };
        if graceful {
            return;
        }

        if !hard_stop.is_cancelled() {
            warn!("Grace period expired; cancelling in-flight fetches");
            hard_stop.cancel();
        }

        let bound = self.config.crawler.fetch_timeout();
        if tokio::time::timeout(bound, join_all(workers)).await.is_err() {
            warn!(
                "Aborting {} worker(s) that did not stop within {:?}",
                workers.len(),
                bound
            );
            workers.abort_all();
            join_all(workers).await;
        }
    }
}

async fn join_all(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        log_join_error(result);
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Worker panicked: {}", e);
        } else {
            debug!("Worker aborted: {}", e);
        }
    }
}

async fn log_progress(stats: Arc<StatsAggregator>, frontier: Arc<Frontier>) {
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let snapshot = stats.snapshot();
        info!(
            "Progress: {} fetched, {} failed, {} queued, {} in flight",
            snapshot.pages_fetched,
            snapshot.pages_failed,
            frontier.len(),
            frontier.in_flight()
        );
    }
}
