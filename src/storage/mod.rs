//! Storage module for persisting harvested records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Batch insertion of product records
//! - Offset/limit reads and counts for the read API
//! - Crawl run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{RecordStore, StorageError, StorageResult};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Store handle shared by the crawl writer and the API readers
pub type SharedStorage<S> = Arc<Mutex<S>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> crate::Result<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Wraps a store so it can be handed to both the crawler and the server
pub fn share<S>(storage: S) -> SharedStorage<S> {
    Arc::new(Mutex::new(storage))
}

/// Locks a shared store, mapping poisoning to a storage error
pub fn lock<S>(storage: &Mutex<S>) -> StorageResult<MutexGuard<'_, S>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Represents a crawl run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub total_pages: u32,
    pub totals: RunTotals,
}

/// Outcome counters stored with a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub pages_failed: u32,
    pub batches_failed: u32,
    pub records_inserted: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}
