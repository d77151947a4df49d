//! SQLite-backed info storage.
//!
//! Async database access using SQLx. Every info update inserts a new row,
//! so older entries remain available as per-nick history.

use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `path`, running migrations.
    ///
    /// `":memory:"` opens a uniquely named in-memory database, so parallel
    /// tests never share state.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let options = if path == ":memory:" {
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:skylark-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );
            SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true)
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        };

        let max_connections = if path == ":memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        info!(path = %path, "database connected");
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), DbError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS info (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 nick TEXT NOT NULL COLLATE NOCASE,
                 user TEXT NOT NULL,
                 host TEXT NOT NULL,
                 info TEXT NOT NULL,
                 recorded_at TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_info_nick ON info (nick)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Repository for per-nick info records.
    pub fn info(&self) -> InfoRepository {
        InfoRepository {
            pool: self.pool.clone(),
        }
    }
}

/// Per-nick info records.
#[derive(Clone)]
pub struct InfoRepository {
    pool: SqlitePool,
}

impl InfoRepository {
    /// Record a new info entry for `nick`. Earlier entries stay as history.
    pub async fn set(&self, nick: &str, user: &str, host: &str, info: &str) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO info (nick, user, host, info, recorded_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(nick)
        .bind(user)
        .bind(host)
        .bind(info)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Latest info for `nick`, if any.
    pub async fn get(&self, nick: &str) -> Result<Option<String>, DbError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT info FROM info WHERE nick = ?1 ORDER BY id DESC LIMIT 1")
                .bind(nick)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Most recent history entries for `nick`, newest first.
    pub async fn history(&self, nick: &str, limit: i64) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT info FROM info WHERE nick = ?1 ORDER BY id DESC LIMIT ?2")
                .bind(nick)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Delete all info records for `nick`, returning how many were removed.
    pub async fn delete(&self, nick: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM info WHERE nick = ?1")
            .bind(nick)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
