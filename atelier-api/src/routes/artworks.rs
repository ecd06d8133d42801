/// Artwork catalogue and visitor interactions
///
/// - `GET /v1/artworks?available=true` - List artworks
/// - `GET /v1/artworks/:id` - Artwork with interaction counts
/// - `POST /v1/artworks/:id/interactions` - Record a view/like/share
/// - `GET /v1/artworks/:id/interactions` - Recent interactions
/// - `POST`, `PATCH /:id`, `DELETE /:id` - Admin writes

use super::{found, parse_id, require_non_blank};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use atelier_shared::models::{
    artwork::{Artwork, CreateArtwork, UpdateArtwork},
    interaction::{CreateInteraction, Interaction, InteractionCounts, InteractionKind},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default and maximum number of interactions returned
const INTERACTIONS_LIMIT: i64 = 50;
const MAX_INTERACTIONS_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only artworks still for sale
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct ArtworkDetail {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub interactions: InteractionCounts,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArtworkRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(max = 100, message = "Medium must be at most 100 characters"))]
    pub medium: Option<String>,

    #[validate(range(min = 1000, max = 9999, message = "Year must have four digits"))]
    pub year: Option<i32>,

    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: String,

    pub public_id: Option<String>,

    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price_cents: Option<i64>,

    pub available: Option<bool>,
}

impl From<CreateArtworkRequest> for CreateArtwork {
    fn from(req: CreateArtworkRequest) -> Self {
        CreateArtwork {
            title: req.title,
            description: req.description,
            medium: req.medium,
            year: req.year,
            image_url: req.image_url,
            public_id: req.public_id,
            price_cents: req.price_cents,
            available: req.available.unwrap_or(true),
        }
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateArtworkRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 100, message = "Medium must be at most 100 characters"))]
    pub medium: Option<String>,

    #[validate(range(min = 1000, max = 9999, message = "Year must have four digits"))]
    pub year: Option<i32>,

    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    pub public_id: Option<String>,

    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price_cents: Option<i64>,

    pub available: Option<bool>,
}

impl From<UpdateArtworkRequest> for UpdateArtwork {
    fn from(req: UpdateArtworkRequest) -> Self {
        UpdateArtwork {
            title: req.title,
            description: req.description,
            medium: req.medium,
            year: req.year,
            image_url: req.image_url,
            public_id: req.public_id,
            price_cents: req.price_cents,
            available: req.available,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct InteractionRequest {
    pub kind: InteractionKind,

    /// Visitor or user id, when the site knows one
    #[validate(length(max = 255, message = "User id must be at most 255 characters"))]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionsQuery {
    pub limit: Option<i64>,
}

pub async fn list_artworks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Artwork>>> {
    Ok(Json(Artwork::list(&state.db, query.available).await?))
}

pub async fn get_artwork(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArtworkDetail>> {
    let uuid = parse_id(&id, "Artwork")?;
    let artwork = found(Artwork::find_by_id(&state.db, uuid).await?, "Artwork")?;
    let interactions = Interaction::counts_for_artwork(&state.db, &uuid.to_string()).await?;

    Ok(Json(ArtworkDetail {
        artwork,
        interactions,
    }))
}

pub async fn create_artwork(
    State(state): State<AppState>,
    Json(req): Json<CreateArtworkRequest>,
) -> ApiResult<(StatusCode, Json<Artwork>)> {
    req.validate()?;

    let artwork = Artwork::create(&state.db, req.into()).await?;
    tracing::info!(artwork_id = %artwork.id, "Artwork created");

    Ok((StatusCode::CREATED, Json(artwork)))
}

pub async fn update_artwork(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateArtworkRequest>,
) -> ApiResult<Json<Artwork>> {
    let id = parse_id(&id, "Artwork")?;
    req.validate()?;

    if let Some(title) = &req.title {
        require_non_blank(title, "title")?;
    }

    let artwork = Artwork::update(&state.db, id, req.into()).await?;
    Ok(Json(found(artwork, "Artwork")?))
}

pub async fn delete_artwork(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "Artwork")?;

    if !Artwork::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Artwork not found".to_string()));
    }

    tracing::info!(artwork_id = %id, "Artwork deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Records a view, like or share for an existing artwork
pub async fn record_interaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<InteractionRequest>,
) -> ApiResult<(StatusCode, Json<Interaction>)> {
    req.validate()?;

    let uuid = parse_id(&id, "Artwork")?;
    found(Artwork::find_by_id(&state.db, uuid).await?, "Artwork")?;

    let interaction = Interaction::create(
        &state.db,
        CreateInteraction {
            artwork_id: uuid.to_string(),
            user_id: req.user_id,
            kind: req.kind,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(interaction)))
}

pub async fn list_interactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<InteractionsQuery>,
) -> ApiResult<Json<Vec<Interaction>>> {
    let uuid = parse_id(&id, "Artwork")?;

    let limit = query
        .limit
        .unwrap_or(INTERACTIONS_LIMIT)
        .clamp(1, MAX_INTERACTIONS_LIMIT);

    Ok(Json(Interaction::list_for_artwork(&state.db, &uuid.to_string(), limit).await?))
}
