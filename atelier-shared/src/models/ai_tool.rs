/// AI tools that cost tokens to use
///
/// Tools are addressed by `slug` from the site; `token_cost` is what the
/// ledger debits per use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiTool {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub token_cost: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAiTool {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub token_cost: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAiTool {
    pub name: Option<String>,
    pub description: Option<String>,
    pub token_cost: Option<i64>,
    pub active: Option<bool>,
}

const COLUMNS: &str = "id, name, slug, description, token_cost, active, created_at, updated_at";

impl AiTool {
    pub async fn create(pool: &PgPool, data: CreateAiTool) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO ai_tools (name, slug, description, token_cost, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, AiTool>(&query)
            .bind(data.name)
            .bind(data.slug)
            .bind(data.description)
            .bind(data.token_cost)
            .bind(data.active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM ai_tools WHERE id = $1", COLUMNS);

        sqlx::query_as::<_, AiTool>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM ai_tools WHERE slug = $1", COLUMNS);

        sqlx::query_as::<_, AiTool>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// All tools, alphabetical
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM ai_tools ORDER BY name ASC", COLUMNS);

        sqlx::query_as::<_, AiTool>(&query).fetch_all(pool).await
    }

    /// Tools visitors can currently use
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM ai_tools WHERE active ORDER BY name ASC",
            COLUMNS
        );

        sqlx::query_as::<_, AiTool>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateAiTool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE ai_tools SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                token_cost = COALESCE($4, token_cost),
                active = COALESCE($5, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, AiTool>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.token_cost)
            .bind(data.active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ai_tools WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
