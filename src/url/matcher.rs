//! Host patterns for the crawl scope

use std::fmt;

/// A parsed scope pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// `a.test` matches only `a.test`
    Exact(String),
    /// `*.a.test` matches `a.test` and every subdomain of it, at any depth
    Subdomains(String),
}

impl HostPattern {
    /// Parses a pattern; comparisons are ASCII case-insensitive
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim().to_ascii_lowercase();
        match pattern.strip_prefix("*.") {
            Some(base) => Self::Subdomains(base.to_string()),
            None => Self::Exact(pattern),
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match self {
            Self::Exact(exact) => host == *exact,
            Self::Subdomains(base) => {
                host == *base
                    || host
                        .strip_suffix(base.as_str())
                        .is_some_and(|label| label.len() > 1 && label.ends_with('.'))
            }
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(host) => f.write_str(host),
            Self::Subdomains(base) => write!(f, "*.{}", base),
        }
    }
}

/// Checks a host against a single pattern string
///
/// ```
/// use polite_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.a.test", "a.test"));
/// assert!(matches_wildcard("*.a.test", "img.cdn.a.test"));
/// assert!(!matches_wildcard("*.a.test", "bad-a.test"));
/// assert!(matches_wildcard("A.TEST", "a.test"));
/// ```
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    HostPattern::parse(pattern).matches(host)
}
