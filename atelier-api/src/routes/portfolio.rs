/// Portfolio gallery endpoints
///
/// - `GET /v1/portfolio?category=&featured=` - List items
/// - `GET /v1/portfolio/:id` - Get one item
/// - `POST /v1/portfolio` - Create (admin)
/// - `PATCH /v1/portfolio/:id` - Partial update (admin)
/// - `DELETE /v1/portfolio/:id` - Delete (admin)

use super::{found, parse_id, require_non_blank};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use atelier_shared::models::portfolio::{
    CreatePortfolioItem, MediaType, PortfolioFilter, PortfolioItem, UpdatePortfolioItem,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,

    #[validate(url(message = "Media URL must be a valid URL"))]
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

impl From<CreateItemRequest> for CreatePortfolioItem {
    fn from(req: CreateItemRequest) -> Self {
        CreatePortfolioItem {
            title: req.title,
            description: req.description,
            category: req.category,
            media_url: req.media_url,
            media_type: req.media_type,
            public_id: req.public_id,
            tags: req.tags,
            featured: req.featured,
            sort_order: req.sort_order,
        }
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,

    #[validate(url(message = "Media URL must be a valid URL"))]
    pub media_url: Option<String>,

    pub media_type: Option<MediaType>,

    pub public_id: Option<String>,

    pub tags: Option<Vec<String>>,

    pub featured: Option<bool>,

    pub sort_order: Option<i32>,
}

impl From<UpdateItemRequest> for UpdatePortfolioItem {
    fn from(req: UpdateItemRequest) -> Self {
        UpdatePortfolioItem {
            title: req.title,
            description: req.description,
            category: req.category,
            media_url: req.media_url,
            media_type: req.media_type,
            public_id: req.public_id,
            tags: req.tags,
            featured: req.featured,
            sort_order: req.sort_order,
        }
    }
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<PortfolioFilter>,
) -> ApiResult<Json<Vec<PortfolioItem>>> {
    Ok(Json(PortfolioItem::list(&state.db, filter).await?))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PortfolioItem>> {
    let id = parse_id(&id, "Portfolio item")?;
    let item = PortfolioItem::find_by_id(&state.db, id).await?;
    Ok(Json(found(item, "Portfolio item")?))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<PortfolioItem>)> {
    req.validate()?;

    let item = PortfolioItem::create(&state.db, req.into()).await?;
    tracing::info!(item_id = %item.id, category = %item.category, "Portfolio item created");

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<PortfolioItem>> {
    let id = parse_id(&id, "Portfolio item")?;
    req.validate()?;

    if let Some(title) = &req.title {
        require_non_blank(title, "title")?;
    }
    if let Some(category) = &req.category {
        require_non_blank(category, "category")?;
    }

    let item = PortfolioItem::update(&state.db, id, req.into()).await?;
    Ok(Json(found(item, "Portfolio item")?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "Portfolio item")?;

    if !PortfolioItem::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Portfolio item not found".to_string()));
    }

    tracing::info!(item_id = %id, "Portfolio item deleted");
    Ok(StatusCode::NO_CONTENT)
}
