/// Artworks shown in the shop
///
/// # Schema
///
/// ```sql
/// CREATE TABLE artworks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     medium VARCHAR(255),
///     year INTEGER,
///     image_url VARCHAR(1024) NOT NULL,
///     public_id VARCHAR(512),
///     price_cents BIGINT,
///     available BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artwork {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub medium: Option<String>,
    pub year: Option<i32>,
    pub image_url: String,
    pub public_id: Option<String>,
    /// Price in cents; `None` means "not for sale"
    pub price_cents: Option<i64>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtwork {
    pub title: String,
    pub description: Option<String>,
    pub medium: Option<String>,
    pub year: Option<i32>,
    pub image_url: String,
    pub public_id: Option<String>,
    pub price_cents: Option<i64>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArtwork {
    pub title: Option<String>,
    pub description: Option<String>,
    pub medium: Option<String>,
    pub year: Option<i32>,
    pub image_url: Option<String>,
    pub public_id: Option<String>,
    pub price_cents: Option<i64>,
    pub available: Option<bool>,
}

const COLUMNS: &str = "id, title, description, medium, year, image_url, public_id, price_cents, \
                       available, created_at, updated_at";

impl Artwork {
    pub async fn create(pool: &PgPool, data: CreateArtwork) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO artworks
                (title, description, medium, year, image_url, public_id, price_cents, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, Artwork>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.medium)
            .bind(data.year)
            .bind(data.image_url)
            .bind(data.public_id)
            .bind(data.price_cents)
            .bind(data.available)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM artworks WHERE id = $1", COLUMNS);

        sqlx::query_as::<_, Artwork>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists artworks, newest first
    pub async fn list(pool: &PgPool, available_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM artworks WHERE ($1 = FALSE OR available) ORDER BY created_at DESC",
            COLUMNS
        );

        sqlx::query_as::<_, Artwork>(&query)
            .bind(available_only)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateArtwork,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE artworks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                medium = COALESCE($4, medium),
                year = COALESCE($5, year),
                image_url = COALESCE($6, image_url),
                public_id = COALESCE($7, public_id),
                price_cents = COALESCE($8, price_cents),
                available = COALESCE($9, available),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, Artwork>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.medium)
            .bind(data.year)
            .bind(data.image_url)
            .bind(data.public_id)
            .bind(data.price_cents)
            .bind(data.available)
            .fetch_optional(pool)
            .await
    }

    /// Deletes the artwork; its interactions are not removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM artworks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
