use crate::store::{Change, MemoryStore};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous}, Pool, Sqlite, ConnectOptions};
use std::str::FromStr;

/// SQLite backing for the key-value store. The whole table is read into a
/// [`MemoryStore`] at startup and journaled writes are flushed back after each request.
#[derive(Clone)]
pub struct Db {
    pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .log_statements(log::LevelFilter::Trace);

        // An in-memory database exists per connection, so keep a single one.
        let pool = SqlitePoolOptions::new()
            .max_connections(if url.contains(":memory:") { 1 } else { 5 })
            .connect_with(options)
            .await?;

        let db = Db { pool };
        db.migrate().await?;

        Ok(db)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads every stored record into a fresh in-memory store.
    pub async fn load_all(&self) -> anyhow::Result<MemoryStore> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM kv ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        log::info!("Loaded {} progress records", rows.len());
        Ok(MemoryStore::from_entries(rows))
    }

    /// Writes journaled changes in one transaction. `None` values delete the key.
    pub async fn apply(&self, changes: &[Change]) -> anyhow::Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for (key, value) in changes {
            match value {
                Some(value) => {
                    sqlx::query(
                        "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"
                    )
                    .bind(key)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query("DELETE FROM kv WHERE key = ?")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        log::debug!("Flushed {} store changes", changes.len());

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM kv")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
