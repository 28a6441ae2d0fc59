//! Durable record of listing ids that have already been processed.

use crate::error::StoreError;
use crate::models::{DedupRecord, Source};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{error, info};

/// Format of SQLite's `CURRENT_TIMESTAMP`, used by older databases
const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Dedup store contract.
///
/// `is_new` fails closed: when the store cannot be read it reports the id as
/// already seen, so a degraded store never causes a burst of notifications.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Create the backing table if it does not exist yet
    async fn initialize(&self) -> Result<(), StoreError>;

    async fn is_new(&self, id: &str) -> bool;

    /// Insert the id unless present. Returns true when a row was added.
    async fn commit(&self, id: &str, source: Source) -> bool;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the SQLite file at `path`
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let connect_err = |source: sqlx::Error| StoreError::Connect {
            path: path.display().to_string(),
            source,
        };

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(connect_err)?;

        Ok(Self { pool })
    }

    pub async fn record(&self, id: &str) -> Result<Option<DedupRecord>, StoreError> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id, source, added_at FROM listings WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(id, source, added_at)| {
            let added_at = parse_added_at(&added_at).ok_or_else(|| StoreError::Timestamp {
                id: id.clone(),
                value: added_at.clone(),
            })?;
            Ok::<_, StoreError>(DedupRecord {
                id,
                source,
                added_at,
            })
        })
        .transpose()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the pool; every later query fails
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Accepts RFC 3339 as written by `commit`, or SQLite's UTC `CURRENT_TIMESTAMP`
fn parse_added_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(value, SQLITE_TIMESTAMP).map(|t| t.and_utc()))
        .ok()
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                added_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database initialized successfully.");
        Ok(())
    }

    async fn is_new(&self, id: &str) -> bool {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM listings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

        match found {
            Ok(row) => row.is_none(),
            Err(e) => {
                error!(listing_id = id, "Error checking listing ID: {}", e);
                false
            }
        }
    }

    async fn commit(&self, id: &str, source: Source) -> bool {
        let inserted =
            sqlx::query("INSERT OR IGNORE INTO listings (id, source, added_at) VALUES (?, ?, ?)")
                .bind(id)
                .bind(source.display_name())
                .bind(Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await;

        match inserted {
            Ok(result) => result.rows_affected() == 1,
            Err(e) => {
                error!(listing_id = id, "Error adding listing ID: {}", e);
                false
            }
        }
    }
}
