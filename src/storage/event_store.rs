//! Event store: schema setup, writes, and ordered queries.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use super::error::StorageError;
use super::row::{EventRow, OrderBy};

/// Default connection acquire timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// DDL for the events table.
///
/// `id` plays the grouping-key role and `title` the default ordering
/// attribute. `date` is part of the key so that multiple observations of one
/// event survive side by side; only repeated `(title, date)` pairs under the
/// same grouping key collide and overwrite.
const EVENTS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id    TEXT NOT NULL,
    title TEXT NOT NULL,
    date  TEXT NOT NULL,
    PRIMARY KEY (id, title, date)
);
"#;

/// Secondary ordering index: serves the date ordering without duplicating
/// the base table.
const EVENTS_DATE_INDEX_DDL: &str =
    "CREATE INDEX IF NOT EXISTS events_date_idx ON events (id, date)";

/// Outcome of a batch write.
///
/// Collects per-row failures instead of swallowing them, so the caller
/// decides whether partial ingestion is acceptable.
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Number of rows written successfully.
    pub written: usize,
    /// Rows that failed to write, with the error for each.
    pub failed: Vec<(EventRow, StorageError)>,
}

impl WriteReport {
    /// True when every row in the batch was written.
    pub fn all_written(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Client for the events table.
///
/// Owns the SQLite connection pool and exposes the three operations the
/// service needs: idempotent table creation, unconditional row writes, and
/// equality-scoped queries ordered by either attribute. Cheap to clone.
#[derive(Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore").finish_non_exhaustive()
    }
}

impl EventStore {
    /// Open the database at `path`, creating it if missing.
    ///
    /// # Configuration
    ///
    /// - WAL journal mode for concurrent readers
    /// - Normal synchronous mode for performance with durability
    pub async fn connect(path: impl AsRef<Path>, pool_size: u32) -> Result<Self, StorageError> {
        let path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Internal(format!(
                    "failed to create database directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(DEFAULT_CONNECT_TIMEOUT)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the events table and its date index if absent.
    ///
    /// Safe to call on every startup; an existing table is not an error.
    pub async fn ensure_table(&self) -> Result<(), StorageError> {
        sqlx::query(EVENTS_TABLE_DDL).execute(&self.pool).await?;
        sqlx::query(EVENTS_DATE_INDEX_DDL)
            .execute(&self.pool)
            .await?;
        tracing::debug!("events table ready");
        Ok(())
    }

    /// Write one row, overwriting any existing row with the same key.
    ///
    /// No conditional write, no existence check: last write wins.
    pub async fn put_row(&self, row: &EventRow) -> Result<(), StorageError> {
        sqlx::query("INSERT OR REPLACE INTO events (id, title, date) VALUES (?1, ?2, ?3)")
            .bind(&row.id)
            .bind(&row.title)
            .bind(&row.date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Write a batch of rows sequentially, best-effort.
    ///
    /// A failed write is recorded in the report and the batch proceeds to the
    /// next row; no rollback, no retry.
    pub async fn put_rows(&self, rows: &[EventRow]) -> WriteReport {
        let mut report = WriteReport::default();
        for row in rows {
            match self.put_row(row).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::warn!(
                        title = %row.title,
                        date = %row.date,
                        error = %e,
                        "failed to write row"
                    );
                    report.failed.push((row.clone(), e));
                }
            }
        }
        report
    }

    /// All rows under `grouping_key`, ascending by the chosen attribute.
    pub async fn query_ordered(
        &self,
        grouping_key: &str,
        order_by: OrderBy,
    ) -> Result<Vec<EventRow>, StorageError> {
        let sql = format!(
            "SELECT id, title, date FROM events WHERE id = ?1 ORDER BY {} ASC",
            order_by.as_column()
        );

        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(grouping_key)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Close the connection pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
