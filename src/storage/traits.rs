//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::output::CrawlStats;
use crate::state::{FetchOutcome, PageState};
use crate::storage::{OutcomeRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Writer thread stopped: {0}")]
    WriterStopped(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished and stores its final counters
    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats: &CrawlStats)
        -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run, if any
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Outcomes =====

    /// Appends one task outcome to a run
    fn insert_outcome(&mut self, run_id: i64, outcome: &FetchOutcome) -> StorageResult<()>;

    /// Gets all outcomes of a run in insertion order
    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<OutcomeRecord>>;

    /// Counts a run's outcomes in the given state
    fn count_outcomes_by_state(&self, run_id: i64, state: PageState) -> StorageResult<u64>;
}
