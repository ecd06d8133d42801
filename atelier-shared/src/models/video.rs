/// Videos streamed through Mux
///
/// A row is created first (status `preparing`), then linked to a Mux asset.
/// Once Mux reports the asset ready the playback id and duration are copied
/// back via [`Video::update_from_mux`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE videos (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     mux_asset_id VARCHAR(255),
///     mux_playback_id VARCHAR(255),
///     thumbnail_url VARCHAR(1024),
///     duration_seconds DOUBLE PRECISION,
///     status VARCHAR(16) NOT NULL DEFAULT 'preparing',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Processing state mirrored from Mux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Preparing,
    Ready,
    Errored,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Preparing => "preparing",
            VideoStatus::Ready => "ready",
            VideoStatus::Errored => "errored",
        }
    }

    /// Maps a Mux asset status string; unknown states count as preparing
    pub fn from_mux(status: &str) -> Self {
        match status {
            "ready" => VideoStatus::Ready,
            "errored" => VideoStatus::Errored,
            _ => VideoStatus::Preparing,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub mux_asset_id: Option<String>,
    pub mux_playback_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// HLS stream URL, once Mux has assigned a playback id
    pub fn stream_url(&self) -> Option<String> {
        self.mux_playback_id
            .as_ref()
            .map(|id| format!("https://stream.mux.com/{}.m3u8", id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideo {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Fields copied from a Mux asset
#[derive(Debug, Clone, Default)]
pub struct MuxSync {
    pub asset_id: String,
    pub playback_id: Option<String>,
    pub duration_seconds: Option<f64>,
    pub status: Option<VideoStatus>,
}

const COLUMNS: &str = "id, title, description, mux_asset_id, mux_playback_id, thumbnail_url, \
                       duration_seconds, status, created_at, updated_at";

impl Video {
    pub async fn create(pool: &PgPool, data: CreateVideo) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (title, description, thumbnail_url) VALUES ($1, $2, $3) RETURNING {}",
            COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.thumbnail_url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM videos WHERE id = $1", COLUMNS);

        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_asset_id(
        pool: &PgPool,
        asset_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM videos WHERE mux_asset_id = $1", COLUMNS);

        sqlx::query_as::<_, Video>(&query)
            .bind(asset_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists videos, newest first; `ready_only` hides unfinished uploads
    pub async fn list(pool: &PgPool, ready_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM videos WHERE ($1 = FALSE OR status = 'ready') ORDER BY created_at DESC",
            COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(ready_only)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateVideo,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE videos SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail_url = COALESCE($4, thumbnail_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.thumbnail_url)
            .fetch_optional(pool)
            .await
    }

    /// Links the row to a Mux asset and copies its current state
    pub async fn update_from_mux(
        pool: &PgPool,
        id: Uuid,
        sync: MuxSync,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE videos SET
                mux_asset_id = $2,
                mux_playback_id = COALESCE($3, mux_playback_id),
                duration_seconds = COALESCE($4, duration_seconds),
                status = COALESCE($5, status),
                thumbnail_url = COALESCE(
                    thumbnail_url,
                    CASE WHEN $3::TEXT IS NULL THEN NULL
                         ELSE 'https://image.mux.com/' || $3 || '/thumbnail.jpg' END
                ),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(sync.asset_id)
            .bind(sync.playback_id)
            .bind(sync.duration_seconds)
            .bind(sync.status.map(|s| s.as_str()))
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
