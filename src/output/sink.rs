//! Result sinks
//!
//! Workers hand every `FetchOutcome` to a `ResultSink`. `write` must return
//! without waiting on I/O; the SQLite sink queues outcomes for a writer thread
//! that owns the database connection.

use crate::crawler::StopReason;
use crate::output::CrawlStats;
use crate::state::FetchOutcome;
use crate::storage::{RunStatus, SqliteStorage, Storage, StorageError, StorageResult};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error};

/// Receives task outcomes as they are produced
pub trait ResultSink: Send + Sync {
    /// Accepts one outcome without blocking the caller
    fn write(&self, outcome: &FetchOutcome);

    /// Flushes pending outcomes and records the end of the run
    ///
    /// Called once, after every worker has exited. May block.
    fn close(&self, _stats: &CrawlStats, _reason: StopReason) {}
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn write(&self, _outcome: &FetchOutcome) {}
}

enum SinkMessage {
    Outcome(Box<FetchOutcome>),
    Finish {
        status: RunStatus,
        stats: Box<CrawlStats>,
    },
}

/// Sink that persists outcomes to SQLite on a dedicated thread
pub struct SqliteSink {
    run_id: i64,
    sender: Mutex<Option<Sender<SinkMessage>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    errors: Arc<AtomicU64>,
}

impl SqliteSink {
    /// Opens the database, creates a run row and starts the writer thread
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash recorded with the run
    pub fn open(path: &Path, config_hash: &str) -> StorageResult<Self> {
        let mut storage = SqliteStorage::new(path)?;
        let run_id = storage.create_run(config_hash)?;
        Self::start(storage, run_id)
    }

    fn start(mut storage: SqliteStorage, run_id: i64) -> StorageResult<Self> {
        let (sender, receiver) = mpsc::channel::<SinkMessage>();
        let errors = Arc::new(AtomicU64::new(0));
        let thread_errors = errors.clone();

        let writer = std::thread::Builder::new()
            .name("sqlite-sink".to_string())
            .spawn(move || {
                for message in receiver {
                    let result = match message {
                        SinkMessage::Outcome(outcome) => storage.insert_outcome(run_id, &outcome),
                        SinkMessage::Finish { status, stats } => {
                            storage.finish_run(run_id, status, &stats)
                        }
                    };
                    if let Err(e) = result {
                        error!("Failed to persist crawl result: {}", e);
                        thread_errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
                debug!("SQLite writer for run {} finished", run_id);
            })?;

        Ok(Self {
            run_id,
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
            errors,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Number of outcomes or run updates that could not be written
    pub fn write_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    fn send(&self, message: SinkMessage) {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let delivered = match sender.as_ref() {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        };
        if !delivered {
            let e = StorageError::WriterStopped(format!("run {}", self.run_id));
            error!("Dropping crawl result: {}", e);
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl ResultSink for SqliteSink {
    fn write(&self, outcome: &FetchOutcome) {
        self.send(SinkMessage::Outcome(Box::new(outcome.clone())));
    }

    fn close(&self, stats: &CrawlStats, reason: StopReason) {
        self.send(SinkMessage::Finish {
            status: reason.into(),
            stats: Box::new(stats.clone()),
        });

        // Dropping the sender ends the writer loop once the queue is drained
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        let writer = self.writer.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(writer) = writer {
            if writer.join().is_err() {
                error!("SQLite writer thread panicked");
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
