//! Robots.txt caching implementation
//!
//! One slot per host key holds the cached rules behind an async mutex. The
//! first caller for a host fetches while holding the slot, and concurrent
//! callers wait on the lock and then read what it stored.

use crate::crawler::HttpFetcher;
use crate::robots::RobotsRules;
use crate::url::{host_key, robots_url};
use crate::TaskError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};
use url::Url;

/// Cached robots.txt data for a host
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt rules
    pub rules: RobotsRules,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,

    /// How long the entry stays fresh
    pub ttl: chrono::Duration,
}

impl CachedRobots {
    pub fn new(rules: RobotsRules, ttl: Duration) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::weeks(5200)),
        }
    }

    /// Checks if the entry has outlived its TTL
    pub fn is_stale(&self) -> bool {
        self.age() > self.ttl
    }

    /// Returns the age of the cached robots.txt
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

/// The robots decision for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsVerdict {
    Allowed,
    Disallowed,
    /// robots.txt could not be fetched; the URL is treated as allowed
    ///
    /// Only the caller that performed the failed fetch receives this variant.
    FailOpen(TaskError),
}

impl RobotsVerdict {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Disallowed)
    }
}

type Slot = Arc<AsyncMutex<Option<CachedRobots>>>;

/// Per-host robots.txt policy with TTL expiry and single-flight fetching
pub struct RobotsCache {
    fetcher: Arc<dyn HttpFetcher>,
    agent_token: String,
    ttl: Duration,
    fetch_timeout: Duration,
    slots: Mutex<HashMap<String, Slot>>,
    fetches: AtomicU64,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `fetcher` - HTTP collaborator used to download robots.txt
    /// * `agent_token` - Product token matched against `User-agent` lines
    /// * `ttl` - How long a fetched policy stays fresh
    /// * `fetch_timeout` - Timeout for each robots.txt request
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        agent_token: impl Into<String>,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            agent_token: agent_token.into(),
            ttl,
            fetch_timeout,
            slots: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Decides whether `url` may be fetched
    ///
    /// Fetches the host's robots.txt when there is no fresh entry. A 4xx
    /// response means there is no policy; a 5xx response or a transport
    /// failure fails open.
    pub async fn is_allowed(&self, url: &Url) -> RobotsVerdict {
        let Some(key) = host_key(url) else {
            return RobotsVerdict::Allowed;
        };

        let slot = self.slot(&key);
        let mut entry = slot.lock().await;

        let mut failure = None;
        if entry.as_ref().map_or(true, CachedRobots::is_stale) {
            let (cached, error) = self.fetch_rules(url, &key).await;
            *entry = Some(cached);
            failure = error;
        }

        let allowed = entry
            .as_ref()
            .map_or(true, |c| c.rules.is_allowed(url.as_str(), &self.agent_token));

        match failure {
            Some(error) => RobotsVerdict::FailOpen(error),
            None if allowed => RobotsVerdict::Allowed,
            None => RobotsVerdict::Disallowed,
        }
    }

    /// Returns the Crawl-delay cached for the URL's host, if any
    ///
    /// Never fetches; a host whose policy is being fetched right now reports none.
    pub fn crawl_delay(&self, url: &Url) -> Option<Duration> {
        let key = host_key(url)?;
        let slot = self.lock_slots().get(&key).cloned()?;
        let entry = slot.try_lock().ok()?;
        let delay = entry
            .as_ref()
            .and_then(|c| c.rules.crawl_delay(&self.agent_token));
        delay
    }

    /// Number of robots.txt requests issued so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    fn slot(&self, key: &str) -> Slot {
        self.lock_slots()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(None)))
            .clone()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn fetch_rules(&self, url: &Url, host: &str) -> (CachedRobots, Option<TaskError>) {
        let Some(robots) = robots_url(url) else {
            return (CachedRobots::new(RobotsRules::allow_all(), self.ttl), None);
        };

        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!("Fetching {}", robots);

        let error = match self.fetcher.fetch(&robots, self.fetch_timeout).await {
            Ok(response) if response.is_success() => {
                let rules = RobotsRules::from_content(&response.body);
                return (CachedRobots::new(rules, self.ttl), None);
            }
            Ok(response) if (400..500).contains(&response.status) => {
                debug!("No robots.txt for {} (HTTP {})", host, response.status);
                return (CachedRobots::new(RobotsRules::allow_all(), self.ttl), None);
            }
            Ok(response) => TaskError::RobotsFetch {
                host: host.to_string(),
                message: format!("HTTP {}", response.status),
            },
            Err(e) => TaskError::RobotsFetch {
                host: host.to_string(),
                message: e.to_string(),
            },
        };

        warn!("{}; allowing all paths", error);
        (
            CachedRobots::new(RobotsRules::allow_all(), self.ttl),
            Some(error),
        )
    }
}
