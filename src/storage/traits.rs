//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::{ProductRecord, StoredRecord};
use crate::storage::{RunRecord, RunTotals};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawl writes through `insert_batch` and the run log; the read API only
/// uses `count_records` and `fetch_records`. Implementations are shared behind
/// a mutex, so methods are synchronous.
pub trait RecordStore {
    // ===== Product Records =====

    /// Inserts one page's batch of records
    ///
    /// The whole batch is applied or none of it is. Each row gets a fresh
    /// auto-increment id in batch order. An empty batch is accepted and
    /// inserts nothing.
    ///
    /// # Returns
    ///
    /// The number of rows inserted
    fn insert_batch(&mut self, batch: &[ProductRecord]) -> StorageResult<usize>;

    /// Reads up to `limit` records starting at `offset`, ordered by id
    fn fetch_records(&self, offset: u64, limit: u64) -> StorageResult<Vec<StoredRecord>>;

    /// Counts all stored records
    fn count_records(&self) -> StorageResult<u64>;

    // ===== Run Log =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, total_pages: u32) -> StorageResult<i64>;

    /// Marks a run as completed and stores its totals
    fn complete_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()>;

    /// Gets the most recent runs, newest first
    fn get_latest_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>>;
}
