use std::str::FromStr;

use mindflow_lesson::{Lesson, LessonSegment};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::StoreError;
use crate::lesson::LessonStore;

/// One persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub id: i64,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and create missing tables.
    ///
    /// `":memory:"` opens a private in-memory database held by a single connection that
    /// is never recycled, so its contents live as long as the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be created.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let pool = if path == ":memory:" {
            let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await?
        } else {
            let opts = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(opts)
                .await?
        };

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the `lessons` and `chat_messages` tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQL statements fail.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS lessons (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                segments TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_user ON chat_messages (user_id, id)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append a chat message and return its row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append_message(
        &self,
        user_id: &str,
        role: &str,
        content: &str,
    ) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO chat_messages (user_id, role, content, created_at)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(user_id)
        .bind(role)
        .bind(content)
        .bind(chrono::Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// The most recent `limit` messages for `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_messages(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatRecord>, StoreError> {
        let limit = i64::try_from(limit)?;
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, role, content, created_at FROM (
                SELECT id, role, content, created_at FROM chat_messages
                WHERE user_id = ?
                ORDER BY id DESC
                LIMIT ?
            ) ORDER BY id ASC",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, role, content, created_at)| ChatRecord {
                id,
                role,
                content,
                created_at,
            })
            .collect())
    }

    /// Delete the chat history of `user_id`. Returns the number of removed messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear_messages(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl LessonStore for SqliteStore {
    async fn get(&self, lesson_id: &str) -> Result<Option<Lesson>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT segments FROM lessons WHERE id = ?")
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some((json,)) = row else {
            return Ok(None);
        };
        let segments: Vec<LessonSegment> = serde_json::from_str(&json)?;
        let lesson = Lesson::new(segments).map_err(|source| StoreError::InvalidLesson {
            id: lesson_id.to_owned(),
            source,
        })?;
        Ok(Some(lesson))
    }

    async fn put(&self, lesson_id: &str, title: &str, lesson: &Lesson) -> Result<(), StoreError> {
        let json = serde_json::to_string(lesson)?;
        sqlx::query(
            "INSERT INTO lessons (id, title, segments, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                segments = excluded.segments,
                updated_at = excluded.updated_at",
        )
        .bind(lesson_id)
        .bind(title)
        .bind(json)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        tracing::info!(lesson_id, segments = lesson.segments().len(), "stored lesson");
        Ok(())
    }
}
