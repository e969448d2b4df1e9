//! Persistent resolution store backed by SQLite (§6 "Persistent store
//! format"). Grounded on the teacher's `database/mod.rs` pool setup
//! (WAL mode, busy timeout) and its repository structs wrapping a
//! `SqlitePool` with small async CRUD methods — scaled down to one table
//! and one in-line `CREATE TABLE IF NOT EXISTS` since there is no
//! `migrations/` directory to manage for a single-table store.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::error;

use revlog_application::ports::ResolutionStore;
use revlog_domain::{Origin, RuntimeError, StoreRecord};

pub struct SqliteResolutionStore {
    pool: SqlitePool,
}

impl SqliteResolutionStore {
    /// Opens (creating if absent) the database file at `path` and ensures
    /// the `resolutions` table exists. A single connection is used so
    /// reads/writes within this process serialize the same way a single
    /// `dbm` handle would (§5, DESIGN.md "concurrent runs" decision).
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS resolutions (
                key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                origin TEXT NOT NULL,
                ts INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

fn store_error(e: sqlx::Error) -> RuntimeError {
    RuntimeError::Store(e.to_string())
}

fn row_to_record(name: String, origin: String, ts: i64) -> Option<StoreRecord> {
    let letter = origin.chars().next()?;
    let origin = Origin::from_letter(letter)?;
    Some(StoreRecord::new(name, origin, ts))
}

#[async_trait]
impl ResolutionStore for SqliteResolutionStore {
    async fn get(&self, key: &str) -> Result<Option<StoreRecord>, RuntimeError> {
        let row: Option<(String, String, i64)> =
            sqlx::query_as("SELECT name, origin, ts FROM resolutions WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(row.and_then(|(name, origin, ts)| row_to_record(name, origin, ts)))
    }

    async fn put(&self, key: &str, record: &StoreRecord) -> Result<(), RuntimeError> {
        sqlx::query(
            "INSERT INTO resolutions (key, name, origin, ts) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET name = excluded.name, origin = excluded.origin, ts = excluded.ts",
        )
        .bind(key)
        .bind(&record.name)
        .bind(record.origin.letter().to_string())
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn dump(&self) -> Result<Vec<(String, StoreRecord)>, RuntimeError> {
        let rows: Vec<(String, String, String, i64)> =
            sqlx::query_as("SELECT key, name, origin, ts FROM resolutions ORDER BY key")
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(key, name, origin, ts)| row_to_record(name, origin, ts).map(|r| (key, r)))
            .collect())
    }

    async fn merge(&self, key: &str, name: &str, now: i64) -> Result<(), RuntimeError> {
        sqlx::query(
            "INSERT INTO resolutions (key, name, origin, ts) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET name = excluded.name, origin = excluded.origin, ts = excluded.ts",
        )
        .bind(key)
        .bind(name)
        .bind(Origin::Merged.letter().to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn expire(&self, cutoff: i64) -> Result<u64, RuntimeError> {
        let result = sqlx::query("DELETE FROM resolutions WHERE ts < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "expire query failed");
                store_error(e)
            })?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteResolutionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE resolutions (key TEXT PRIMARY KEY, name TEXT NOT NULL, origin TEXT NOT NULL, ts INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        SqliteResolutionStore { pool }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = memory_store().await;
        let record = StoreRecord::new("host.example".to_string(), Origin::Nameserver, 1_000);
        store.put("10.0.0.1", &record).await.unwrap();
        let fetched = store.get("10.0.0.1").await.unwrap().unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let store = memory_store().await;
        assert_eq!(store.get("10.0.0.9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn merge_upserts_with_merged_origin() {
        let store = memory_store().await;
        store.merge("10.0.0.2", "manual.example", 42).await.unwrap();
        let fetched = store.get("10.0.0.2").await.unwrap().unwrap();
        assert_eq!(fetched.origin, Origin::Merged);
        assert_eq!(fetched.timestamp, 42);
    }

    #[tokio::test]
    async fn expire_removes_only_older_records() {
        let store = memory_store().await;
        store
            .put("old", &StoreRecord::new("a".to_string(), Origin::Nameserver, 10))
            .await
            .unwrap();
        store
            .put("new", &StoreRecord::new("b".to_string(), Origin::Nameserver, 1000))
            .await
            .unwrap();
        let removed = store.expire(500).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn dump_lists_in_key_order() {
        let store = memory_store().await;
        store
            .put("b", &StoreRecord::new("b.example".to_string(), Origin::Nameserver, 1))
            .await
            .unwrap();
        store
            .put("a", &StoreRecord::new("a.example".to_string(), Origin::Recursed, 2))
            .await
            .unwrap();
        let dumped = store.dump().await.unwrap();
        assert_eq!(dumped.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
