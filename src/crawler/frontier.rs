//! Shared work queue for the worker pool
//!
//! The queue, the in-flight counter and the closed flag live behind a single
//! lock so that "queue empty and nothing in flight" is observed atomically. A
//! worker that pops a task counts as in flight until it calls
//! `notify_in_flight(-1)`, which it does only after pushing the task's children.

use crate::state::CrawlTask;
use crate::url::VisitedSet;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<CrawlTask>,
    in_flight: usize,
    closed: bool,
}

/// FIFO frontier with deduplication, depth limiting and termination detection
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<Inner>,
    visited: VisitedSet,
    max_depth: u32,
    notify: Notify,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            visited: VisitedSet::new(),
            max_depth,
            notify: Notify::new(),
        }
    }

    /// Offers a task to the frontier
    ///
    /// Tasks deeper than the maximum depth, URLs already visited this run and
    /// anything offered after `close()` are dropped.
    ///
    /// # Returns
    ///
    /// `true` if the task was queued
    pub fn push(&self, task: CrawlTask) -> bool {
        if task.depth > self.max_depth {
            debug!("Dropping {} (depth {} > {})", task.url, task.depth, self.max_depth);
            return false;
        }

        let mut inner = self.lock();
        if inner.closed {
            debug!("Dropping {} (frontier closed)", task.url);
            return false;
        }
        if !self.visited.mark_visited(&task.url) {
            return false;
        }

        inner.queue.push_back(task);
        drop(inner);

        self.notify.notify_one();
        true
    }

    /// Takes the next task, waiting for one if necessary
    ///
    /// Returns `None` once the crawl has terminated (queue empty and no task
    /// in flight), after `close()`, or when `cancel` fires. A returned task
    /// counts as in flight.
    pub async fn pop(&self, cancel: &CancellationToken) -> Option<CrawlTask> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if cancel.is_cancelled() {
                return None;
            }

            {
                let mut inner = self.lock();
                if inner.closed {
                    return None;
                }

                while let Some(task) = inner.queue.pop_front() {
                    if task.depth > self.max_depth {
                        debug!("Skipping {} (depth {})", task.url, task.depth);
                        continue;
                    }
                    inner.in_flight += 1;
                    return Some(task);
                }

                if inner.in_flight == 0 {
                    inner.closed = true;
                    drop(inner);
                    debug!("Frontier exhausted");
                    self.notify.notify_waiters();
                    return None;
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = &mut notified => {}
            }
        }
    }

    /// Adjusts the number of tasks being processed by workers
    pub fn notify_in_flight(&self, delta: i64) {
        let mut inner = self.lock();
        inner.in_flight = (inner.in_flight as i64 + delta).max(0) as usize;
        let exhausted = inner.in_flight == 0 && inner.queue.is_empty();
        drop(inner);

        if exhausted {
            self.notify.notify_waiters();
        }
    }

    /// Stops dispatch; every later `pop` returns `None`
    ///
    /// Idempotent. Tasks still queued are left undispatched.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of queued, undispatched tasks
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Number of distinct URLs accepted this run
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    fn task(path: &str, depth: u32) -> CrawlTask {
        let mut task = CrawlTask::seed(Url::parse(&format!("https://a.test{}", path)).unwrap());
        task.depth = depth;
        task
    }

    #[tokio::test]
    async fn test_push_and_pop_fifo() {
        let frontier = Frontier::new(2);
        let cancel = CancellationToken::new();

        assert!(frontier.push(task("/a", 0)));
        assert!(frontier.push(task("/b", 0)));

        assert_eq!(frontier.pop(&cancel).await.unwrap().url.path(), "/a");
        assert_eq!(frontier.pop(&cancel).await.unwrap().url.path(), "/b");
        assert_eq!(frontier.in_flight(), 2);
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let frontier = Frontier::new(2);
        assert!(frontier.push(task("/a", 0)));
        assert!(!frontier.push(task("/a", 1)));
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.visited_count(), 1);
    }

    #[test]
    fn test_push_rejects_too_deep() {
        let frontier = Frontier::new(1);
        assert!(frontier.push(task("/a", 1)));
        assert!(!frontier.push(task("/b", 2)));

        // A rejected deep task must not consume the URL
        assert!(frontier.push(task("/b", 1)));
    }

    #[test]
    fn test_push_after_close_is_rejected() {
        let frontier = Frontier::new(2);
        frontier.close();
        assert!(!frontier.push(task("/a", 0)));
        assert!(frontier.is_closed());
    }

    #[tokio::test]
    async fn test_terminates_when_empty_and_idle() {
        let frontier = Frontier::new(2);
        let cancel = CancellationToken::new();

        frontier.push(task("/a", 0));
        let popped = frontier.pop(&cancel).await;
        assert!(popped.is_some());

        frontier.notify_in_flight(-1);
        assert!(frontier.pop(&cancel).await.is_none());
        assert!(frontier.is_closed());
    }

    #[tokio::test]
    async fn test_waiting_pop_sees_new_work() {
        let frontier = Arc::new(Frontier::new(2));
        let cancel = CancellationToken::new();

        frontier.push(task("/a", 0));
        let first = frontier.pop(&cancel).await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { frontier.pop(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(frontier.push(first.child(Url::parse("https://a.test/b").unwrap())));
        frontier.notify_in_flight(-1);

        let second = waiter.await.unwrap().unwrap();
        assert_eq!(second.url.path(), "/b");
        assert_eq!(second.depth, 1);
    }

    #[tokio::test]
    async fn test_waiting_pops_wake_on_termination() {
        let frontier = Arc::new(Frontier::new(2));
        let cancel = CancellationToken::new();

        frontier.push(task("/a", 0));
        frontier.pop(&cancel).await.unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let frontier = frontier.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { frontier.pop(&cancel).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.notify_in_flight(-1);

        for waiter in waiters {
            let result = tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter did not wake")
                .unwrap();
            assert!(result.is_none());
        }
    }

    #[tokio::test]
    async fn test_cancel_unblocks_pop() {
        let frontier = Arc::new(Frontier::new(2));
        let cancel = CancellationToken::new();

        frontier.push(task("/a", 0));
        frontier.pop(&cancel).await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { frontier.pop(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("pop ignored cancellation")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_close_stops_dispatch_of_queued_tasks() {
        let frontier = Frontier::new(2);
        let cancel = CancellationToken::new();

        frontier.push(task("/a", 0));
        frontier.push(task("/b", 0));
        frontier.close();

        assert!(frontier.pop(&cancel).await.is_none());
        assert_eq!(frontier.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_pushes_of_same_url_accept_once() {
        let frontier = Arc::new(Frontier::new(2));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let frontier = frontier.clone();
                tokio::spawn(async move { frontier.push(task("/same", 0)) })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(frontier.len(), 1);
    }
}
