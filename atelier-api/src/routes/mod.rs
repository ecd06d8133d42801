/// API route handlers
///
/// One module per resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh
/// - `portfolio`, `artworks`, `videos`, `ai_tools`, `pages`: Site content
/// - `tokens`, `payments`: Token ledger and Stripe purchases
/// - `media`, `storage`: Cloudinary and S3/B2 uploads
/// - `analytics`: Page views and the 30-day summary

pub mod ai_tools;
pub mod analytics;
pub mod artworks;
pub mod auth;
pub mod health;
pub mod media;
pub mod pages;
pub mod payments;
pub mod portfolio;
pub mod storage;
pub mod tokens;
pub mod videos;

use crate::error::ApiError;
use uuid::Uuid;

/// Parses a UUID path segment, answering 404 for malformed ids
pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} not found", resource)))
}

/// Maps a missing row to a 404 with a resource-specific message
pub(crate) fn found<T>(value: Option<T>, resource: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::NotFound(format!("{} not found", resource)))
}

/// Requires at least one non-blank string, reporting `field` otherwise
pub(crate) fn require_non_blank(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::ValidationError(vec![
            crate::error::ValidationErrorDetail::new(field, format!("{} must not be empty", field)),
        ]));
    }
    Ok(())
}
