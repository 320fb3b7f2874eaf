//! Repository Implementation

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::StorageError;

/// One persisted classification result.
///
/// Rows are inserted once and never mutated; `updated_at` equals
/// `created_at` until some future operation modifies the row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClassificationRecord {
    pub id: i64,
    pub serial_number: String,
    pub result: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite repository for classification results
#[derive(Clone)]
pub struct ResultRepository {
    pool: SqlitePool,
}

impl ResultRepository {
    /// Connect to the database, creating the file if missing
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory database on a single connection, schema initialized.
    /// One connection keeps all queries on the same memory database.
    pub async fn memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.init_schema().await?;
        Ok(repo)
    }

    /// Create the results table and its lookup index, idempotently
    pub async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS classification_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                serial_number TEXT NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_results_serial_created
             ON classification_results (serial_number, created_at)",
        )
        .execute(&self.pool)
        .await?;

        debug!("Schema initialized");
        Ok(())
    }

    /// Insert one classification result.
    ///
    /// A single INSERT, so the row either exists fully or not at all.
    pub async fn insert(
        &self,
        serial_number: &str,
        result: &str,
    ) -> Result<ClassificationRecord, StorageError> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, ClassificationRecord>(
            r#"
            INSERT INTO classification_results (serial_number, result, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, serial_number, result, created_at, updated_at
            "#,
        )
        .bind(serial_number)
        .bind(result)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(
            "Inserted result {} for serial {}",
            record.id, record.serial_number
        );
        Ok(record)
    }

    /// Latest result for one serial number, if any.
    ///
    /// Latest means maximum `created_at`; ties fall back to the highest
    /// id, which follows insertion order.
    pub async fn latest_for_serial(
        &self,
        serial_number: &str,
    ) -> Result<Option<ClassificationRecord>, StorageError> {
        let record = sqlx::query_as::<_, ClassificationRecord>(
            r#"
            SELECT id, serial_number, result, created_at, updated_at
            FROM classification_results
            WHERE serial_number = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Latest result per distinct serial number, newest-first.
    ///
    /// Ids are monotonic within a serial, so MAX(id) selects the row
    /// with the maximum `created_at`.
    pub async fn latest_per_serial(&self) -> Result<Vec<ClassificationRecord>, StorageError> {
        let records = sqlx::query_as::<_, ClassificationRecord>(
            r#"
            SELECT id, serial_number, result, created_at, updated_at
            FROM classification_results
            WHERE id IN (
                SELECT MAX(id) FROM classification_results GROUP BY serial_number
            )
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found latest results for {} serials", records.len());
        Ok(records)
    }

    /// Total stored results, for the health endpoint
    pub async fn result_count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classification_results")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
