/// Cloudinary media endpoints (admin)
///
/// - `POST /v1/media/sign` - Signature bundle for direct or chunked uploads
/// - `POST /v1/media/upload` - Proxy a small multipart upload
/// - `DELETE /v1/media/:public_id?resource_type=` - Destroy an asset
///
/// Files larger than [`MAX_DIRECT_UPLOAD_BYTES`] go straight to Cloudinary
/// with a signature bundle, usually through the `atelier-upload` CLI.
/// Public ids containing folders must encode `/` as `%2F`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    integrations::cloudinary::{CloudinaryClient, DestroyResult},
};
use atelier_shared::{chunking::MEDIA_CHUNK_SIZE, cloudinary::SignatureBundle};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Largest file accepted by the upload proxy
pub const MAX_DIRECT_UPLOAD_BYTES: usize = MEDIA_CHUNK_SIZE as usize;

/// Room for multipart boundaries and text fields on top of the file
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const RESOURCE_TYPES: &[&str] = &["image", "video", "raw", "auto"];

fn resource_type(value: Option<String>) -> ApiResult<String> {
    let value = value.unwrap_or_else(|| "auto".to_string());

    if RESOURCE_TYPES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!(
            "resource_type must be one of {}",
            RESOURCE_TYPES.join(", ")
        )))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignRequest {
    #[validate(length(max = 255, message = "Folder must be at most 255 characters"))]
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub resource_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignResponse {
    #[serde(flatten)]
    pub bundle: SignatureBundle,

    /// Where to POST the file (or its chunks)
    pub upload_url: String,
}

pub async fn sign_upload(
    State(state): State<AppState>,
    Json(req): Json<SignRequest>,
) -> ApiResult<Json<SignResponse>> {
    req.validate()?;

    let cloudinary = CloudinaryClient::new(&state.http, state.config.cloudinary.as_ref())?;
    let folder = req.folder.filter(|f| !f.trim().is_empty());

    let bundle = cloudinary.sign(folder.as_deref());
    let upload_url = bundle.upload_url("auto");

    Ok(Json(SignResponse { bundle, upload_url }))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(format!(
            "Files over {} bytes must use a signed direct upload",
            MAX_DIRECT_UPLOAD_BYTES
        ));
    }
    ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}

/// Uploads one small file through the API
///
/// Multipart fields: `file` (required), `folder`, `resource_type`.
///
/// # Errors
///
/// - `413 Payload Too Large`: File over [`MAX_DIRECT_UPLOAD_BYTES`]
/// - `502 Bad Gateway`: Cloudinary rejected the upload
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let cloudinary = CloudinaryClient::new(&state.http, state.config.cloudinary.as_ref())?;

    let mut file: Option<(String, Bytes)> = None;
    let mut folder = None;
    let mut kind = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data));
            }
            Some("folder") => folder = Some(field.text().await.map_err(multipart_error)?),
            Some("resource_type") => kind = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    if data.len() > MAX_DIRECT_UPLOAD_BYTES {
        return Err(ApiError::PayloadTooLarge(format!(
            "Files over {} bytes must use a signed direct upload",
            MAX_DIRECT_UPLOAD_BYTES
        )));
    }

    let kind = resource_type(kind)?;
    let folder = folder.filter(|f| !f.trim().is_empty());
    let size = data.len();

    let asset = cloudinary
        .upload(data, filename.clone(), folder.as_deref(), &kind)
        .await?;

    tracing::info!(filename = %filename, size, folder = ?folder, "Media uploaded");
    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<DestroyResult>> {
    let cloudinary = CloudinaryClient::new(&state.http, state.config.cloudinary.as_ref())?;

    // Destroy needs a concrete type
    let kind = match resource_type(query.resource_type)?.as_str() {
        "auto" => "image".to_string(),
        other => other.to_string(),
    };

    let result = cloudinary.destroy(&public_id, &kind).await?;

    if result.result == "not found" {
        return Err(ApiError::NotFound("Asset not found".to_string()));
    }

    tracing::info!(public_id = %public_id, "Media deleted");
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type() {
        assert_eq!(resource_type(None).unwrap(), "auto");
        assert_eq!(resource_type(Some("video".into())).unwrap(), "video");
        assert!(resource_type(Some("document".into())).is_err());
    }
}
