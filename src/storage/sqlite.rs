//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::record::{ProductRecord, StoredRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, RunTotals};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, total_pages,
     pages_failed, batches_failed, records_inserted";

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
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> crate::Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets API readers proceed while the crawl writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn stored_record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        price: row.get(2)?,
        rating: row.get(3)?,
        url: row.get(4)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        total_pages: row.get(5)?,
        totals: RunTotals {
            pages_failed: row.get(6)?,
            batches_failed: row.get(7)?,
            records_inserted: row.get::<_, i64>(8)? as u64,
        },
    })
}

impl RecordStore for SqliteStorage {
    // ===== Product Records =====

    fn insert_batch(&mut self, batch: &[ProductRecord]) -> StorageResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (title, price, rating, url) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in batch {
                stmt.execute(params![record.title, record.price, record.rating, record.url])?;
            }
        }
        tx.commit()?;

        Ok(batch.len())
    }

    fn fetch_records(&self, offset: u64, limit: u64) -> StorageResult<Vec<StoredRecord>> {
        // SQLite binds signed integers; anything larger is past the end anyway
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            "SELECT id, title, price, rating, url FROM products ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;

        let records = stmt
            .query_map(params![limit, offset], stored_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Log =====

    fn create_run(&mut self, config_hash: &str, total_pages: u32) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status, total_pages) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, RunStatus::Running.to_db_string(), total_pages],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_failed = ?3,
             batches_failed = ?4, records_inserted = ?5 WHERE id = ?6",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                totals.pages_failed,
                totals.batches_failed,
                totals.records_inserted as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_latest_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT ?1", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(n: usize) -> ProductRecord {
        ProductRecord {
            title: format!("Laptop {}", n),
            price: format!("${}.00", n),
            rating: String::new(),
            url: format!("https://example.com/dp/{}", n),
        }
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_round_trip_record() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let product = ProductRecord {
            title: "Laptop X".to_string(),
            price: "$999.00".to_string(),
            rating: "4.5 out of 5 stars".to_string(),
            url: "https://example.com/dp/ABC".to_string(),
        };

        assert_eq!(storage.insert_batch(std::slice::from_ref(&product)).unwrap(), 1);

        let stored = storage.fetch_records(0, 10).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].id > 0);
        assert_eq!(stored[0].to_product(), product);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.insert_batch(&[]).unwrap(), 0);
        assert_eq!(storage.count_records().unwrap(), 0);
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_batch(&[record(1), record(2)]).unwrap();
        storage.insert_batch(&[record(3)]).unwrap();

        let stored = storage.fetch_records(0, 10).unwrap();
        let titles: Vec<_> = stored.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Laptop 1", "Laptop 2", "Laptop 3"]);
        assert!(stored.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_offset_and_limit() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let batch: Vec<_> = (1..=25).map(record).collect();
        storage.insert_batch(&batch).unwrap();

        assert_eq!(storage.count_records().unwrap(), 25);

        let page = storage.fetch_records(10, 10).unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page[0].title, "Laptop 11");

        let last = storage.fetch_records(20, 10).unwrap();
        assert_eq!(last.len(), 5);

        assert!(storage.fetch_records(30, 10).unwrap().is_empty());
    }

    #[test]
    fn test_offset_beyond_sqlite_range_is_empty() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_batch(&[record(1)]).unwrap();

        assert!(storage.fetch_records(u64::MAX - 9, 10).unwrap().is_empty());
        assert_eq!(storage.fetch_records(0, u64::MAX).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_batch(&[record(1)]).unwrap();
        storage.insert_batch(&[record(1)]).unwrap();
        assert_eq!(storage.count_records().unwrap(), 2);
    }

    #[test]
    fn test_run_lifecycle() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("abc123", 24).unwrap();

        let run = storage.get_latest_runs(1).unwrap().remove(0);
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.total_pages, 24);
        assert!(run.finished_at.is_none());

        let totals = RunTotals {
            pages_failed: 2,
            batches_failed: 1,
            records_inserted: 300,
        };
        storage.complete_run(run_id, &totals).unwrap();

        let run = storage.get_latest_runs(1).unwrap().remove(0);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.totals, totals);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_missing_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.complete_run(42, &RunTotals::default()),
            Err(StorageError::RunNotFound(42))
        ));
    }

    #[test]
    fn test_latest_runs_newest_first() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_run("a", 1).unwrap();
        let second = storage.create_run("b", 1).unwrap();

        let runs = storage.get_latest_runs(10).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[1].id, first);
    }

    #[test]
    fn test_on_disk_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage.insert_batch(&[record(1), record(2)]).unwrap();
        }

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_records().unwrap(), 2);
    }
}
