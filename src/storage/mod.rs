//! Storage module for persisting crawl results
//!
//! This module handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - Run tracking with final counters
//! - Per-task outcome records

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::StopReason;
use crate::output::CrawlStats;
use crate::state::PageState;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    /// Final counters; all zero while the run is in progress
    pub stats: CrawlStats,
}

/// Represents one stored task outcome
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub url: String,
    pub depth: u32,
    pub source_url: Option<String>,
    pub state: PageState,
    pub http_status: Option<u16>,
    pub byte_size: u64,
    pub link_count: u32,
    pub error: Option<String>,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub recorded_at: String,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Timeout,
    Interrupted,
    Requested,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Timeout => "timeout",
            Self::Interrupted => "interrupted",
            Self::Requested => "requested",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "timeout" => Some(Self::Timeout),
            "interrupted" => Some(Self::Interrupted),
            "requested" => Some(Self::Requested),
            _ => None,
        }
    }
}

impl From<StopReason> for RunStatus {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Completed => Self::Completed,
            StopReason::Timeout => Self::Timeout,
            StopReason::Interrupted => Self::Interrupted,
            StopReason::Requested => Self::Requested,
        }
    }
}
