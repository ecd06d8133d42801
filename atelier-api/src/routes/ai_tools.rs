/// AI tool catalogue
///
/// - `GET /v1/ai-tools` - Active tools with their token cost
/// - `POST`, `PATCH /:id`, `DELETE /:id` - Admin writes
///
/// Spending tokens on a tool goes through `POST /v1/tokens/use`.

use super::{found, parse_id, require_non_blank};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use atelier_shared::models::ai_tool::{AiTool, CreateAiTool, UpdateAiTool};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("Slug may only contain lowercase letters, digits and '-'".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateToolRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(
        length(max = 100, message = "Slug must be at most 100 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: String,

    pub description: Option<String>,

    #[validate(range(min = 1, message = "Token cost must be positive"))]
    pub token_cost: i64,

    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateToolRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 1, message = "Token cost must be positive"))]
    pub token_cost: Option<i64>,

    pub active: Option<bool>,
}

impl From<UpdateToolRequest> for UpdateAiTool {
    fn from(req: UpdateToolRequest) -> Self {
        UpdateAiTool {
            name: req.name,
            description: req.description,
            token_cost: req.token_cost,
            active: req.active,
        }
    }
}

pub async fn list_tools(State(state): State<AppState>) -> ApiResult<Json<Vec<AiTool>>> {
    Ok(Json(AiTool::list_active(&state.db).await?))
}

pub async fn create_tool(
    State(state): State<AppState>,
    Json(req): Json<CreateToolRequest>,
) -> ApiResult<(StatusCode, Json<AiTool>)> {
    req.validate()?;

    let tool = AiTool::create(
        &state.db,
        CreateAiTool {
            name: req.name,
            slug: req.slug,
            description: req.description,
            token_cost: req.token_cost,
            active: req.active.unwrap_or(true),
        },
    )
    .await?;

    tracing::info!(tool_id = %tool.id, slug = %tool.slug, cost = tool.token_cost, "AI tool created");
    Ok((StatusCode::CREATED, Json(tool)))
}

pub async fn update_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateToolRequest>,
) -> ApiResult<Json<AiTool>> {
    let id = parse_id(&id, "AI tool")?;
    req.validate()?;

    if let Some(name) = &req.name {
        require_non_blank(name, "name")?;
    }

    let tool = AiTool::update(&state.db, id, req.into()).await?;
    Ok(Json(found(tool, "AI tool")?))
}

pub async fn delete_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "AI tool")?;

    if !AiTool::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("AI tool not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_characters() {
        assert!(validate_slug("upscale-2x").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Upscale").is_err());
        assert!(validate_slug("up scale").is_err());
    }

    #[test]
    fn test_update_request_mirrors_create_rules() {
        assert!(UpdateToolRequest::default().validate().is_ok());

        let free = UpdateToolRequest {
            token_cost: Some(0),
            ..Default::default()
        };
        assert!(free.validate().is_err());

        let long_name = UpdateToolRequest {
            name: Some("n".repeat(101)),
            ..Default::default()
        };
        assert!(long_name.validate().is_err());

        let repriced = UpdateToolRequest {
            token_cost: Some(25),
            ..Default::default()
        };
        assert!(repriced.validate().is_ok());
    }
}
