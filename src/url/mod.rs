//! URL handling module for Polite-Crawler
//!
//! This module provides URL canonicalization, the visited set used for
//! deduplication, host extraction, and host scope classification.

mod domain;
mod matcher;
mod normalize;
mod visited;

use crate::config::ScopeConfig;

// Re-export main functions
pub use domain::{extract_host, host_key, robots_url};
pub use matcher::{matches_wildcard, HostPattern};
pub use normalize::canonicalize;
pub use visited::VisitedSet;

/// Host scope classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostScope {
    /// Host may be crawled
    Allowed,
    /// Host matches a deny pattern
    Denied,
    /// An allow list exists and the host is not on it
    OutOfScope,
}

impl HostScope {
    /// Returns true if links to this host should be followed
    pub fn should_crawl(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Classifies a host according to the scope configuration
///
/// The deny list is checked first, then the allow list. An empty allow list
/// admits every host that is not denied.
///
/// # Examples
///
/// ```
/// use polite_crawler::config::ScopeConfig;
/// use polite_crawler::url::{classify_host, HostScope};
///
/// let scope = ScopeConfig {
///     allow: vec!["*.a.test".to_string()],
///     deny: vec!["ads.a.test".to_string()],
/// };
/// assert_eq!(classify_host("www.a.test", &scope), HostScope::Allowed);
/// assert_eq!(classify_host("ads.a.test", &scope), HostScope::Denied);
/// assert_eq!(classify_host("b.test", &scope), HostScope::OutOfScope);
/// ```
pub fn classify_host(host: &str, scope: &ScopeConfig) -> HostScope {
    if scope.deny.iter().any(|p| matches_wildcard(p, host)) {
        return HostScope::Denied;
    }

    if scope.allow.is_empty() || scope.allow.iter().any(|p| matches_wildcard(p, host)) {
        return HostScope::Allowed;
    }

    HostScope::OutOfScope
}
