//! HTTP fetcher implementation
//!
//! This module handles the network side of the crawler:
//! - The `HttpFetcher` seam that workers and the robots cache fetch through
//! - Building the reqwest client with the crawler's user agent string
//! - Classifying transport failures into task errors
//!
//! Cancellation is not part of the trait. Callers race the returned future
//! against a cancellation token and drop it to abandon the request.

use crate::config::UserAgentConfig;
use crate::TaskError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for a single request
pub const MAX_REDIRECTS: usize = 10;

/// A response received from a server, whatever its status
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub final_url: Url,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the body should be parsed for links
    ///
    /// A missing Content-Type is treated as HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            }
            None => true,
        }
    }
}

/// Performs a single HTTP GET
///
/// Implementations return `Ok` for every response that arrived, including
/// error statuses; `Err` is reserved for timeouts and transport failures.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TaskError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use polite_crawler::config::UserAgentConfig;
/// use polite_crawler::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PoliteCrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
///     contact_email: "bot@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `HttpFetcher` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with a client configured from the user agent settings
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TaskError> {
        let classify = |e: reqwest::Error| classify_error(url, timeout, e);

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(classify)?;

        Ok(HttpResponse {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

fn classify_error(url: &Url, timeout: Duration, e: reqwest::Error) -> TaskError {
    if e.is_timeout() {
        TaskError::FetchTimeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        TaskError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
