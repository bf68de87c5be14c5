//! Run lifecycle and cancellation signals
//!
//! A run is `Running` until the frontier is exhausted or something asks it to
//! stop. Stopping happens in two steps:
//!
//! 1. `drain` fires: no task is dispatched any more and workers stop waiting
//!    on politeness or retry delays. Fetches already on the wire continue.
//! 2. `hard_stop` fires when the grace period runs out (or on a forced stop):
//!    in-flight fetches are dropped and recorded as cancelled.
//!
//! Both signals are idempotent and can never be reset.

use std::fmt;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Lifecycle state of a crawl run; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrawlState {
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The frontier ran out of work
    Completed,
    /// The global crawl timeout expired
    Timeout,
    /// The process received an interrupt
    Interrupted,
    /// `ShutdownHandle::stop` was called
    Requested,
}

impl StopReason {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Timeout => "timeout",
            Self::Interrupted => "interrupted",
            Self::Requested => "requested",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: CrawlState,
    reason: Option<StopReason>,
}

/// Shared cancellation state for one run
#[derive(Debug)]
pub(crate) struct Shutdown {
    drain: CancellationToken,
    hard_stop: CancellationToken,
    lifecycle: Mutex<Lifecycle>,
}

impl Shutdown {
    pub(crate) fn new() -> Self {
        Self {
            drain: CancellationToken::new(),
            hard_stop: CancellationToken::new(),
            lifecycle: Mutex::new(Lifecycle {
                state: CrawlState::Running,
                reason: None,
            }),
        }
    }

    pub(crate) fn drain_token(&self) -> &CancellationToken {
        &self.drain
    }

    pub(crate) fn hard_stop_token(&self) -> &CancellationToken {
        &self.hard_stop
    }

    /// Enters `Draining`; the first reason given wins
    pub(crate) fn begin_drain(&self, reason: StopReason) {
        {
            let mut lifecycle = self.lock();
            if lifecycle.state != CrawlState::Running {
                return;
            }
            lifecycle.state = CrawlState::Draining;
            lifecycle.reason = Some(reason);
        }

        info!("Draining crawl ({})", reason);
        self.drain.cancel();
    }

    /// Drains and abandons in-flight fetches immediately
    pub(crate) fn force(&self, reason: StopReason) {
        self.begin_drain(reason);
        self.hard_stop.cancel();
    }

    /// Enters `Stopped` and returns the final stop reason
    pub(crate) fn finish(&self) -> StopReason {
        let mut lifecycle = self.lock();
        lifecycle.state = CrawlState::Stopped;
        *lifecycle.reason.get_or_insert(StopReason::Completed)
    }

    pub(crate) fn state(&self) -> CrawlState {
        self.lock().state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cloneable handle for stopping a running crawl from outside
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<Shutdown>,
}

impl ShutdownHandle {
    pub(crate) fn new(shutdown: Arc<Shutdown>) -> Self {
        Self { shutdown }
    }

    /// Starts a graceful stop; in-flight fetches get the grace period
    pub fn stop(&self) {
        self.shutdown.begin_drain(StopReason::Requested);
    }

    /// Starts a graceful stop caused by a process interrupt
    pub fn interrupt(&self) {
        self.shutdown.begin_drain(StopReason::Interrupted);
    }

    /// Stops without waiting for in-flight fetches
    pub fn force_stop(&self) {
        self.shutdown.force(StopReason::Interrupted);
    }

    pub fn state(&self) -> CrawlState {
        self.shutdown.state()
    }
}
