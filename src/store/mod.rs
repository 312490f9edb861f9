use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// Default timeout for individual SQLite queries.
/// A hung database operation stalls only the issuing request.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(QUERY_TIMEOUT.as_secs())),
    }
}

// ─── Row types ────────────────────────────────────────────────────────────────

/// A persisted task. `id` is assigned by the store at creation time and is
/// the sole lookup/delete key.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub content: String,
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Errors returned by the task store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("required field '{0}' is empty or missing")]
    EmptyField(&'static str),
    #[error("invalid task id: {0}")]
    InvalidId(String),
    #[error("database query timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Unavailable(#[from] sqlx::Error),
}

// ─── TaskStore ────────────────────────────────────────────────────────────────

/// Durable CRUD over the task collection, backed by SQLite in WAL mode.
///
/// The pool hands each operation a scoped connection and reclaims it on
/// every exit path, including errors.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("todod.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        sqlx::migrate!("src/store/migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(Self { pool })
    }

    /// Return every stored task. An empty result is not an error.
    /// List order is whatever SQLite returns — callers must not rely on it.
    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>, StoreError> {
        with_timeout(async {
            Ok(sqlx::query_as("SELECT id, title, content FROM tasks")
                .fetch_all(&self.pool)
                .await?)
        })
        .await
    }

    /// Persist a new task and return its assigned id.
    /// Both fields are validated before any database I/O.
    pub async fn create_task(&self, title: &str, content: &str) -> Result<String, StoreError> {
        if title.is_empty() {
            return Err(StoreError::EmptyField("title"));
        }
        if content.is_empty() {
            return Err(StoreError::EmptyField("content"));
        }

        let id = Uuid::new_v4().to_string();
        with_timeout(async {
            sqlx::query("INSERT INTO tasks (id, title, content) VALUES (?, ?, ?)")
                .bind(&id)
                .bind(title)
                .bind(content)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await?;
        Ok(id)
    }

    /// Remove the task with the given id.
    ///
    /// Deleting an id that is not present still succeeds — callers cannot
    /// distinguish "deleted" from "was already absent". A string that does
    /// not parse as a UUID is rejected before touching the database.
    pub async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let id = Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))?;
        with_timeout(async {
            sqlx::query("DELETE FROM tasks WHERE id = ?")
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }
}
