/// Video endpoints backed by Mux
///
/// - `GET /v1/videos` - Ready videos (`?all=true` includes processing ones)
/// - `GET /v1/videos/:id` - One video with its stream URL
/// - `POST`, `PATCH /:id`, `DELETE /:id` - Admin writes
/// - `POST /v1/videos/:id/mux` - Create a Mux asset from a source URL
/// - `POST /v1/videos/:id/mux/sync` - Copy the asset's state back
/// - `GET /v1/mux/uploads` - Direct upload URL for large source files

use super::{found, parse_id, require_non_blank};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    integrations::mux::{MuxClient, MuxUpload},
};
use atelier_shared::models::video::{CreateVideo, UpdateVideo, Video};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Include videos still processing or errored
    #[serde(default)]
    pub all: bool,
}

/// Video plus its derived HLS URL
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    #[serde(flatten)]
    pub video: Video,
    pub stream_url: Option<String>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        let stream_url = video.stream_url();
        VideoResponse { video, stream_url }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,
}

impl From<UpdateVideoRequest> for UpdateVideo {
    fn from(req: UpdateVideoRequest) -> Self {
        UpdateVideo {
            title: req.title,
            description: req.description,
            thumbnail_url: req.thumbnail_url,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachAssetRequest {
    /// Publicly reachable source file (e.g. a Cloudinary or B2 URL)
    #[validate(url(message = "Input URL must be a valid URL"))]
    pub input_url: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Origin the browser will upload from
    pub cors_origin: Option<String>,
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<VideoResponse>>> {
    let videos = Video::list(&state.db, !query.all).await?;
    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoResponse>> {
    let id = parse_id(&id, "Video")?;
    let video = found(Video::find_by_id(&state.db, id).await?, "Video")?;
    Ok(Json(video.into()))
}

pub async fn create_video(
    State(state): State<AppState>,
    Json(req): Json<CreateVideoRequest>,
) -> ApiResult<(StatusCode, Json<VideoResponse>)> {
    req.validate()?;

    let video = Video::create(
        &state.db,
        CreateVideo {
            title: req.title,
            description: req.description,
            thumbnail_url: req.thumbnail_url,
        },
    )
    .await?;

    tracing::info!(video_id = %video.id, "Video created");
    Ok((StatusCode::CREATED, Json(video.into())))
}

pub async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateVideoRequest>,
) -> ApiResult<Json<VideoResponse>> {
    let id = parse_id(&id, "Video")?;
    req.validate()?;

    if let Some(title) = &req.title {
        require_non_blank(title, "title")?;
    }

    let video = Video::update(&state.db, id, req.into()).await?;
    Ok(Json(found(video, "Video")?.into()))
}

/// Deletes the row; the Mux asset itself is left alone
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "Video")?;

    if !Video::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    tracing::info!(video_id = %id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn existing_video(state: &AppState, raw_id: &str) -> ApiResult<(Uuid, Video)> {
    let id = parse_id(raw_id, "Video")?;
    let video = found(Video::find_by_id(&state.db, id).await?, "Video")?;
    Ok((id, video))
}

/// Creates a Mux asset for the video and links it
pub async fn attach_mux_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AttachAssetRequest>,
) -> ApiResult<Json<VideoResponse>> {
    req.validate()?;

    let mux = MuxClient::new(&state.http, state.config.mux.as_ref())?;
    let (id, video) = existing_video(&state, &id).await?;

    if let Some(asset_id) = &video.mux_asset_id {
        return Err(ApiError::Conflict(format!(
            "Video already linked to Mux asset {}",
            asset_id
        )));
    }

    let asset = mux.create_asset(&req.input_url).await?;
    tracing::info!(video_id = %id, asset_id = %asset.id, "Mux asset created");

    let video = Video::update_from_mux(&state.db, id, asset.to_sync()).await?;
    Ok(Json(found(video, "Video")?.into()))
}

/// Re-reads the linked Mux asset and stores its status, playback id and duration
pub async fn sync_mux_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoResponse>> {
    let mux = MuxClient::new(&state.http, state.config.mux.as_ref())?;
    let (id, video) = existing_video(&state, &id).await?;

    let asset_id = video
        .mux_asset_id
        .ok_or_else(|| ApiError::BadRequest("Video has no Mux asset".to_string()))?;

    let asset = mux.get_asset(&asset_id).await?;
    tracing::debug!(video_id = %id, asset_id = %asset.id, status = %asset.status, "Mux asset synced");

    let video = Video::update_from_mux(&state.db, id, asset.to_sync()).await?;
    Ok(Json(found(video, "Video")?.into()))
}

/// Direct upload URL; the CORS origin defaults to the first configured origin
pub async fn create_mux_upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
) -> ApiResult<Json<MuxUpload>> {
    let mux = MuxClient::new(&state.http, state.config.mux.as_ref())?;

    let origin = query
        .cors_origin
        .or_else(|| state.config.api.cors_origins.first().cloned())
        .unwrap_or_else(|| "*".to_string());

    Ok(Json(mux.create_direct_upload(&origin).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_mirrors_create_rules() {
        assert!(UpdateVideoRequest::default().validate().is_ok());

        let long_title = UpdateVideoRequest {
            title: Some("x".repeat(256)),
            ..Default::default()
        };
        assert!(long_title.validate().is_err());

        let bad_thumbnail = UpdateVideoRequest {
            thumbnail_url: Some("thumb.jpg".to_string()),
            ..Default::default()
        };
        assert!(bad_thumbnail.validate().is_err());
    }
}
