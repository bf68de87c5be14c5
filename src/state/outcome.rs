use crate::state::{CrawlTask, PageState};
use crate::TaskError;
use std::time::Duration;

/// The result of processing one crawl task
///
/// Produced once per task and handed to the statistics aggregator and the
/// result sink; nothing keeps it afterwards.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub task: CrawlTask,
    pub state: PageState,
    pub http_status: Option<u16>,
    pub byte_size: u64,
    /// Outbound links as extracted, before canonicalization and dedup
    pub extracted_links: Vec<String>,
    pub error: Option<TaskError>,
    /// Requests sent for this task (0 if it never reached the network)
    pub attempts: u32,
    pub elapsed: Duration,
}

impl FetchOutcome {
    pub fn fetched(
        task: CrawlTask,
        http_status: u16,
        byte_size: u64,
        extracted_links: Vec<String>,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            task,
            state: PageState::Fetched,
            http_status: Some(http_status),
            byte_size,
            extracted_links,
            error: None,
            attempts,
            elapsed,
        }
    }

    pub fn failed(task: CrawlTask, error: TaskError, attempts: u32, elapsed: Duration) -> Self {
        let http_status = match &error {
            TaskError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        };

        Self {
            task,
            state: PageState::Failed,
            http_status,
            byte_size: 0,
            extracted_links: Vec::new(),
            error: Some(error),
            attempts,
            elapsed,
        }
    }

    pub fn disallowed(task: CrawlTask) -> Self {
        Self {
            task,
            state: PageState::Disallowed,
            http_status: None,
            byte_size: 0,
            extracted_links: Vec::new(),
            error: None,
            attempts: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn cancelled(task: CrawlTask, attempts: u32, elapsed: Duration) -> Self {
        let error = TaskError::Cancelled {
            url: task.url.to_string(),
        };

        Self {
            task,
            state: PageState::Cancelled,
            http_status: None,
            byte_size: 0,
            extracted_links: Vec::new(),
            error: Some(error),
            attempts,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn task() -> CrawlTask {
        CrawlTask::seed(Url::parse("https://a.test/").unwrap())
    }

    #[test]
    fn test_failed_keeps_http_status() {
        let error = TaskError::HttpStatus {
            url: "https://a.test/".to_string(),
            status: 503,
        };
        let outcome = FetchOutcome::failed(task(), error, 3, Duration::from_millis(10));

        assert_eq!(outcome.state, PageState::Failed);
        assert_eq!(outcome.http_status, Some(503));
        assert_eq!(outcome.attempts, 3);
    }

    #[test]
    fn test_cancelled_carries_error() {
        let outcome = FetchOutcome::cancelled(task(), 1, Duration::ZERO);

        assert_eq!(outcome.state, PageState::Cancelled);
        assert!(matches!(outcome.error, Some(TaskError::Cancelled { .. })));
    }
}
