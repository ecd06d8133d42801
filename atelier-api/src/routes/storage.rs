/// S3 / Backblaze B2 presigned uploads (admin)
///
/// ```text
/// POST /v1/storage/presign
///
/// {"key": "originals/2025/canvas.tif", "content_type": "image/tiff", "expires_in": 900}
/// ```
///
/// The response holds a `PUT` URL the client uploads the body to directly.

use crate::{
    app::AppState,
    error::ApiResult,
    integrations::s3::{presign_put, PresignedRequest, DEFAULT_EXPIRY_SECS},
};
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PresignRequest {
    #[validate(length(min = 1, max = 1024, message = "Key must be 1-1024 characters"))]
    pub key: String,

    #[validate(length(max = 255, message = "Content type must be at most 255 characters"))]
    pub content_type: Option<String>,

    /// Seconds, at most [`crate::integrations::s3::MAX_EXPIRY_SECS`]
    pub expires_in: Option<u64>,
}

pub async fn presign_upload(
    State(state): State<AppState>,
    Json(req): Json<PresignRequest>,
) -> ApiResult<Json<PresignedRequest>> {
    req.validate()?;

    let presigned = presign_put(
        state.config.storage.as_ref(),
        &req.key,
        req.content_type.as_deref(),
        req.expires_in.unwrap_or(DEFAULT_EXPIRY_SECS),
        Utc::now(),
    )?;

    tracing::info!(key = %req.key, expires_in = presigned.expires_in, "Presigned storage upload");
    Ok(Json(presigned))
}
