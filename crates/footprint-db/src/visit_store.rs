//! Operations on the `visitor_tracking` table.
//!
//! One row per tracked navigation. Rows are immutable; the `event_id`
//! column is unique so a re-submitted event is silently ignored.

use footprint_types::TrackingEvent;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Upper bound on rows returned by a single history query.
const MAX_QUERY_ROWS: i64 = 1000;

/// Operations on the `visitor_tracking` table.
pub struct VisitStore<'a> {
    pool: &'a PgPool,
}

impl<'a> VisitStore<'a> {
    /// Create a visit store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert one tracking event.
    ///
    /// Returns `true` if a row was written, `false` if a row with the same
    /// `event_id` already existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, event: &TrackingEvent) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"INSERT INTO visitor_tracking (event_id, visitor_id, session_id, page_url, page_title, referrer, user_agent, device_type, browser, os, user_id, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
              ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event.event_id)
        .bind(event.visitor_id.as_str())
        .bind(event.session_id.as_str())
        .bind(&event.page_url)
        .bind(&event.page_title)
        .bind(event.referrer.as_deref())
        .bind(&event.user_agent)
        .bind(event.device_type.as_str())
        .bind(event.browser.as_str())
        .bind(event.os.as_str())
        .bind(event.user_id.as_deref())
        .bind(event.created_at)
        .execute(self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        tracing::debug!(event_id = %event.event_id, inserted, "Inserted visit");
        Ok(inserted)
    }

    /// Most recent visits for a visitor, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn recent_for_visitor(
        &self,
        visitor_id: &str,
        limit: i64,
    ) -> Result<Vec<VisitRow>, DbError> {
        let rows = sqlx::query_as::<_, VisitRow>(
            r"SELECT id, event_id, visitor_id, session_id, page_url, page_title, referrer, user_agent, device_type, browser, os, user_id, created_at
              FROM visitor_tracking
              WHERE visitor_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(visitor_id)
        .bind(limit.clamp(0, MAX_QUERY_ROWS))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// All visits recorded in a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn for_session(&self, session_id: &str) -> Result<Vec<VisitRow>, DbError> {
        let rows = sqlx::query_as::<_, VisitRow>(
            r"SELECT id, event_id, visitor_id, session_id, page_url, page_title, referrer, user_agent, device_type, browser, os, user_id, created_at
              FROM visitor_tracking
              WHERE session_id = $1
              ORDER BY created_at, id
              LIMIT $2",
        )
        .bind(session_id)
        .bind(MAX_QUERY_ROWS)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// A row from the `visitor_tracking` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VisitRow {
    /// Auto-incremented row ID.
    pub id: i64,
    /// Idempotency key supplied by the dispatcher.
    pub event_id: Uuid,
    /// Visitor identity.
    pub visitor_id: String,
    /// Session identity.
    pub session_id: String,
    /// Page URL.
    pub page_url: String,
    /// Page title.
    pub page_title: String,
    /// Referring URL.
    pub referrer: Option<String>,
    /// Raw user agent.
    pub user_agent: String,
    /// Device class as stored text.
    pub device_type: String,
    /// Browser family as stored text.
    pub browser: String,
    /// Operating system as stored text.
    pub os: String,
    /// Authenticated user, if any.
    pub user_id: Option<String>,
    /// Capture timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}
