//! SQLite-backed refresh token store
//!
//! One row per Google account, keyed by e-mail address:
//!
//! ```sql
//! oauth_tokens(user_id TEXT PRIMARY KEY, refresh_token TEXT, token_type TEXT)
//! ```
//!
//! The consent server upserts rows; the Drive backend reads them.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

use crate::StorageError;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS oauth_tokens (
    user_id TEXT PRIMARY KEY,
    refresh_token TEXT NOT NULL,
    token_type TEXT NOT NULL
)";

/// A stored refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub refresh_token: String,
    pub token_type: String,
}

/// Refresh tokens persisted in SQLite
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Opens (creating if needed) the database at `path`
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Database(sqlx::Error::Configuration(
                    format!("cannot create {}: {e}", parent.display()).into(),
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::migrate(&pool).await?;

        info!(path = %path.display(), "Token store opened");
        Ok(Self { pool })
    }

    /// Creates an in-memory store for testing
    ///
    /// Uses a single connection, as SQLite in-memory databases are
    /// per-connection.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE_SQL).execute(pool).await?;
        Ok(())
    }

    /// Inserts or replaces the token for `user_id`
    pub async fn save(
        &self,
        user_id: &str,
        refresh_token: &str,
        token_type: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO oauth_tokens (user_id, refresh_token, token_type)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                refresh_token = excluded.refresh_token,
                token_type = excluded.token_type",
        )
        .bind(user_id)
        .bind(refresh_token)
        .bind(token_type)
        .execute(&self.pool)
        .await?;

        debug!(user_id, "Saved refresh token");
        Ok(())
    }

    /// Returns the token stored for `user_id`, if any
    pub async fn get(&self, user_id: &str) -> Result<Option<StoredToken>, StorageError> {
        let row = sqlx::query(
            "SELECT refresh_token, token_type FROM oauth_tokens WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| StoredToken {
            refresh_token: r.get("refresh_token"),
            token_type: r.get("token_type"),
        }))
    }
}
