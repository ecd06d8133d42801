/// Portfolio gallery items
///
/// Each item points at a hosted image or video (usually Cloudinary, so
/// `public_id` is kept for later deletion). Listing order is the admin's
/// `sort_order`, newest first on ties.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE portfolio (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     category VARCHAR(100) NOT NULL,
///     media_url VARCHAR(1024) NOT NULL,
///     media_type VARCHAR(16) NOT NULL DEFAULT 'image',
///     public_id VARCHAR(512),
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     featured BOOLEAN NOT NULL DEFAULT FALSE,
///     sort_order INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of media an item displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

/// Portfolio item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PortfolioItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub media_url: String,
    pub media_type: String,
    pub public_id: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePortfolioItem {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub media_url: String,
    pub media_type: MediaType,
    pub public_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Partial update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePortfolioItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub public_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Listing filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

const COLUMNS: &str = "id, title, description, category, media_url, media_type, public_id, \
                       tags, featured, sort_order, created_at, updated_at";

impl PortfolioItem {
    pub async fn create(pool: &PgPool, data: CreatePortfolioItem) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO portfolio
                (title, description, category, media_url, media_type, public_id, tags, featured, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, PortfolioItem>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.category)
            .bind(data.media_url)
            .bind(data.media_type.as_str())
            .bind(data.public_id)
            .bind(data.tags)
            .bind(data.featured)
            .bind(data.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM portfolio WHERE id = $1", COLUMNS);

        sqlx::query_as::<_, PortfolioItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists items matching `filter` in display order
    pub async fn list(pool: &PgPool, filter: PortfolioFilter) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {} FROM portfolio
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::BOOLEAN IS NULL OR featured = $2)
            ORDER BY sort_order ASC, created_at DESC
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, PortfolioItem>(&query)
            .bind(filter.category)
            .bind(filter.featured)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdatePortfolioItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE portfolio SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                media_url = COALESCE($5, media_url),
                media_type = COALESCE($6, media_type),
                public_id = COALESCE($7, public_id),
                tags = COALESCE($8, tags),
                featured = COALESCE($9, featured),
                sort_order = COALESCE($10, sort_order),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, PortfolioItem>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.category)
            .bind(data.media_url)
            .bind(data.media_type.map(|m| m.as_str()))
            .bind(data.public_id)
            .bind(data.tags)
            .bind(data.featured)
            .bind(data.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Deletes the row only; the hosted media is the caller's to remove
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM portfolio WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
