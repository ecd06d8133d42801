/// Visitor interactions with artworks (views, likes, shares)
///
/// `artwork_id` is a plain string reference; nothing checks that the artwork
/// exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    Share,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Like => "like",
            InteractionKind::Share => "share",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Interaction {
    pub id: Uuid,
    pub artwork_id: String,
    pub user_id: Option<String>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInteraction {
    pub artwork_id: String,
    pub user_id: Option<String>,
    pub kind: InteractionKind,
}

/// Per-kind totals for one artwork
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InteractionCounts {
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
}

impl Interaction {
    pub async fn create(pool: &PgPool, data: CreateInteraction) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO interactions (artwork_id, user_id, kind)
            VALUES ($1, $2, $3)
            RETURNING id, artwork_id, user_id, kind, created_at
            "#,
        )
        .bind(data.artwork_id)
        .bind(data.user_id)
        .bind(data.kind.as_str())
        .fetch_one(pool)
        .await
    }

    /// Interactions for one artwork, newest first
    pub async fn list_for_artwork(
        pool: &PgPool,
        artwork_id: &str,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Interaction>(
            r#"
            SELECT id, artwork_id, user_id, kind, created_at
            FROM interactions
            WHERE artwork_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(artwork_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn counts_for_artwork(
        pool: &PgPool,
        artwork_id: &str,
    ) -> Result<InteractionCounts, sqlx::Error> {
        sqlx::query_as::<_, InteractionCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE kind = 'view') AS views,
                COUNT(*) FILTER (WHERE kind = 'like') AS likes,
                COUNT(*) FILTER (WHERE kind = 'share') AS shares
            FROM interactions
            WHERE artwork_id = $1
            "#,
        )
        .bind(artwork_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM interactions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_lowercase() {
        let kind: InteractionKind = serde_json::from_str("\"like\"").unwrap();
        assert_eq!(kind, InteractionKind::Like);
        assert!(serde_json::from_str::<InteractionKind>("\"purchase\"").is_err());
    }
}
