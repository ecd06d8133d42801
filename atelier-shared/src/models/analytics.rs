/// Raw page-view records
///
/// One row per page view. The visit duration is filled in later, when the
/// page reports how long it stayed open. Aggregation happens in
/// [`crate::analytics`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageView {
    pub id: Uuid,
    pub page: String,
    pub visitor_id: Option<String>,
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePageView {
    pub page: String,
    pub visitor_id: Option<String>,
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

const COLUMNS: &str =
    "id, page, visitor_id, session_id, referrer, user_agent, duration_ms, created_at";

impl PageView {
    pub async fn record_pageview(
        pool: &PgPool,
        data: CreatePageView,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO analytics (page, visitor_id, session_id, referrer, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, PageView>(&query)
            .bind(data.page)
            .bind(data.visitor_id)
            .bind(data.session_id)
            .bind(data.referrer)
            .bind(data.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Sets the visit duration; returns `false` for an unknown id
    pub async fn record_duration(
        pool: &PgPool,
        id: Uuid,
        duration_ms: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE analytics SET duration_ms = $2 WHERE id = $1")
            .bind(id)
            .bind(duration_ms)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM analytics WHERE id = $1", COLUMNS);

        sqlx::query_as::<_, PageView>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every view recorded at or after `since`, oldest first
    pub async fn list_since(
        pool: &PgPool,
        since: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM analytics WHERE created_at >= $1 ORDER BY created_at ASC",
            COLUMNS
        );

        sqlx::query_as::<_, PageView>(&query)
            .bind(since)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM analytics WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
