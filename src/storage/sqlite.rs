//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::output::CrawlStats;
use crate::state::{FetchOutcome, PageState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{OutcomeRecord, RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, \
    pages_dispatched, pages_fetched, pages_failed, pages_cancelled, pages_disallowed, \
    robots_failures, retries, bytes_downloaded, links_discovered";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let started_at: String = row.get(1)?;
    let finished_at: Option<String> = row.get(2)?;

    let stats = CrawlStats {
        pages_dispatched: row.get::<_, i64>(5)? as u64,
        pages_fetched: row.get::<_, i64>(6)? as u64,
        pages_failed: row.get::<_, i64>(7)? as u64,
        pages_cancelled: row.get::<_, i64>(8)? as u64,
        pages_disallowed: row.get::<_, i64>(9)? as u64,
        robots_failures: row.get::<_, i64>(10)? as u64,
        retries: row.get::<_, i64>(11)? as u64,
        bytes_downloaded: row.get::<_, i64>(12)? as u64,
        links_discovered: row.get::<_, i64>(13)? as u64,
        started_at: parse_timestamp(&started_at).unwrap_or_else(Utc::now),
        finished_at: finished_at.as_deref().and_then(parse_timestamp),
    };

    Ok(RunRecord {
        id: row.get(0)?,
        started_at,
        finished_at,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        stats,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &CrawlStats,
    ) -> StorageResult<()> {
        let finished_at = stats.finished_at.unwrap_or_else(Utc::now).to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2,
                pages_dispatched = ?3, pages_fetched = ?4, pages_failed = ?5,
                pages_cancelled = ?6, pages_disallowed = ?7, robots_failures = ?8,
                retries = ?9, bytes_downloaded = ?10, links_discovered = ?11
             WHERE id = ?12",
            params![
                status.to_db_string(),
                finished_at,
                stats.pages_dispatched as i64,
                stats.pages_fetched as i64,
                stats.pages_failed as i64,
                stats.pages_cancelled as i64,
                stats.pages_disallowed as i64,
                stats.robots_failures as i64,
                stats.retries as i64,
                stats.bytes_downloaded as i64,
                stats.links_discovered as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        Ok(self.conn.query_row(&sql, [], run_from_row).optional()?)
    }

    // ===== Outcomes =====

    fn insert_outcome(&mut self, run_id: i64, outcome: &FetchOutcome) -> StorageResult<()> {
        let task = &outcome.task;
        self.conn.execute(
            "INSERT INTO outcomes (run_id, url, depth, source_url, state, http_status,
                byte_size, link_count, error, attempts, elapsed_ms, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                run_id,
                task.url.as_str(),
                task.depth,
                task.source_url.as_ref().map(|u| u.as_str()),
                outcome.state.to_db_string(),
                outcome.http_status,
                outcome.byte_size as i64,
                outcome.extracted_links.len() as i64,
                outcome.error.as_ref().map(|e| e.to_string()),
                outcome.attempts,
                outcome.elapsed.as_millis() as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<OutcomeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, depth, source_url, state, http_status, byte_size, link_count,
                error, attempts, elapsed_ms, recorded_at
             FROM outcomes WHERE run_id = ?1 ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                Ok(OutcomeRecord {
                    url: row.get(0)?,
                    depth: row.get(1)?,
                    source_url: row.get(2)?,
                    state: PageState::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(PageState::Failed),
                    http_status: row.get(4)?,
                    byte_size: row.get::<_, i64>(5)? as u64,
                    link_count: row.get(6)?,
                    error: row.get(7)?,
                    attempts: row.get(8)?,
                    elapsed_ms: row.get::<_, i64>(9)? as u64,
                    recorded_at: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_outcomes_by_state(&self, run_id: i64, state: PageState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM outcomes WHERE run_id = ?1 AND state = ?2",
            params![run_id, state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
