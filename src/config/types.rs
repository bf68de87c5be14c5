use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Polite-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Seed URLs the crawl starts from (depth 0)
    #[serde(default)]
    pub seeds: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of concurrent workers
    pub workers: u32,

    /// Global crawl timeout (milliseconds, 0 disables it)
    #[serde(rename = "global-timeout-ms")]
    pub global_timeout_ms: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "fetch-timeout-ms")]
    pub fetch_timeout_ms: u64,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "min-host-delay-ms")]
    pub min_host_delay_ms: u64,

    /// Time in-flight fetches may keep running after a stop (milliseconds)
    #[serde(rename = "grace-period-ms")]
    pub grace_period_ms: u64,

    /// Retries after the first failed attempt of a transient failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled on each further retry (milliseconds)
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,

    /// How long a fetched robots.txt stays fresh (seconds)
    #[serde(rename = "robots-ttl-secs")]
    pub robots_ttl_secs: u64,

    /// Whether robots.txt is fetched and honored at all
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            workers: 8,
            global_timeout_ms: 0,
            fetch_timeout_ms: 10_000,
            min_host_delay_ms: 1_000,
            grace_period_ms: 5_000,
            max_retries: 2,
            retry_base_delay_ms: 500,
            robots_ttl_secs: 24 * 60 * 60,
            respect_robots: true,
        }
    }
}

impl CrawlerConfig {
    pub fn global_timeout(&self) -> Option<Duration> {
        (self.global_timeout_ms > 0).then(|| Duration::from_millis(self.global_timeout_ms))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn min_host_delay(&self) -> Duration {
        Duration::from_millis(self.min_host_delay_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn robots_ttl(&self) -> Duration {
        Duration::from_secs(self.robots_ttl_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PoliteCrawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database receiving fetch outcomes
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,

    /// Path to the markdown summary written at the end of a run
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

/// Host patterns restricting which discovered links are followed
///
/// Patterns are exact hosts or `*.example.com` wildcards. An empty allow list
/// admits every host; the deny list always wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}
