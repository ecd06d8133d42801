/// CMS page content
///
/// Each `(page, section)` pair holds one JSON document that the site
/// renders (hero copy, about text, contact details...). Site-wide settings
/// live under the [`SETTINGS_PAGE`] page.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE page_content (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     page VARCHAR(100) NOT NULL,
///     section VARCHAR(100) NOT NULL,
///     content JSONB NOT NULL DEFAULT '{}'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (page, section)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Page name reserved for site settings
pub const SETTINGS_PAGE: &str = "settings";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageContent {
    pub id: Uuid,
    pub page: String,
    pub section: String,
    pub content: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, page, section, content, created_at, updated_at";

impl PageContent {
    pub async fn get(
        pool: &PgPool,
        page: &str,
        section: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM page_content WHERE page = $1 AND section = $2",
            COLUMNS
        );

        sqlx::query_as::<_, PageContent>(&query)
            .bind(page)
            .bind(section)
            .fetch_optional(pool)
            .await
    }

    /// All sections of one page, by section name
    pub async fn list_for_page(pool: &PgPool, page: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM page_content WHERE page = $1 ORDER BY section ASC",
            COLUMNS
        );

        sqlx::query_as::<_, PageContent>(&query)
            .bind(page)
            .fetch_all(pool)
            .await
    }

    /// Inserts or replaces the content of a section
    pub async fn upsert(
        pool: &PgPool,
        page: &str,
        section: &str,
        content: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO page_content (page, section, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (page, section)
            DO UPDATE SET content = EXCLUDED.content, updated_at = NOW()
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, PageContent>(&query)
            .bind(page)
            .bind(section)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, page: &str, section: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM page_content WHERE page = $1 AND section = $2")
            .bind(page)
            .bind(section)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Folds a page's sections into one `{section: content}` object
pub fn page_document(sections: &[PageContent]) -> JsonValue {
    let map = sections
        .iter()
        .map(|s| (s.section.clone(), s.content.clone()))
        .collect::<serde_json::Map<_, _>>();

    JsonValue::Object(map)
}
