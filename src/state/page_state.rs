//! Terminal states recorded for a processed crawl task

use std::fmt;

/// The final state of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Page was fetched with a 2xx response
    Fetched,

    /// Every attempt failed (timeout, transport error, non-2xx status)
    Failed,

    /// robots.txt disallows the URL; it was never requested
    Disallowed,

    /// The crawl stopped before the task finished
    Cancelled,
}

impl PageState {
    /// Returns true if this represents a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    /// Returns true if a request was sent and counted as processed
    ///
    /// Fetched and Failed pages contribute to `pages_fetched + pages_failed`;
    /// skipped and cancelled tasks do not.
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Fetched | Self::Failed)
    }

    /// Converts the page state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Disallowed => "disallowed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a page state from a database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "fetched" => Some(Self::Fetched),
            "failed" => Some(Self::Failed),
            "disallowed" => Some(Self::Disallowed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> [Self; 4] {
        [Self::Fetched, Self::Failed, Self::Disallowed, Self::Cancelled]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
