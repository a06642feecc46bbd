//! Operations on the `system_logs` table.

use footprint_types::LogRecord;
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `system_logs` table.
pub struct LogStore<'a> {
    pool: &'a PgPool,
}

impl<'a> LogStore<'a> {
    /// Create a log store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert one structured log record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if the metadata cannot be encoded,
    /// or [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, record: &LogRecord) -> Result<(), DbError> {
        let metadata = serde_json::to_value(&record.metadata)?;

        sqlx::query(
            r"INSERT INTO system_logs (level, category, source, message, user_id, metadata, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.level.as_str())
        .bind(record.category.as_str())
        .bind(&record.source)
        .bind(&record.message)
        .bind(record.user_id.as_deref())
        .bind(metadata)
        .bind(record.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Most recent records in a category, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn recent_by_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<LogRow>, DbError> {
        let rows = sqlx::query_as::<_, LogRow>(
            r"SELECT id, level, category, source, message, user_id, metadata, created_at
              FROM system_logs
              WHERE category = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(category)
        .bind(limit.max(0))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// A row from the `system_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    /// Auto-incremented row ID.
    pub id: i64,
    /// Severity as stored text.
    pub level: String,
    /// Category as stored text.
    pub category: String,
    /// Call site identity.
    pub source: String,
    /// Message.
    pub message: String,
    /// Authenticated user, if any.
    pub user_id: Option<String>,
    /// Enriched metadata payload.
    pub metadata: serde_json::Value,
    /// Capture timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}
