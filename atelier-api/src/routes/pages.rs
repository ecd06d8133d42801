/// CMS page content
///
/// - `GET /v1/pages/:page` - Every section of a page as one `{section: content}` object
/// - `GET /v1/pages/:page/:section` - One section
/// - `PUT /v1/pages/:page/:section` - Replace a section (admin)
/// - `DELETE /v1/pages/:page/:section` - Remove a section (admin)
///
/// Site-wide settings live under the `settings` page.

use super::found;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use atelier_shared::models::page_content::{page_document, PageContent};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Longest page or section name
const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page: String,
    pub sections: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct UpsertSectionRequest {
    pub content: JsonValue,
}

fn check_name(value: &str, field: &str) -> ApiResult<()> {
    let valid = !value.is_empty()
        && value.len() <= MAX_NAME_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            field,
            format!(
                "{} must be 1-{} characters of letters, digits, '-' or '_'",
                field, MAX_NAME_LEN
            ),
        )]))
    }
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> ApiResult<Json<PageResponse>> {
    let sections = PageContent::list_for_page(&state.db, &page).await?;

    if sections.is_empty() {
        return Err(ApiError::NotFound(format!("Page '{}' not found", page)));
    }

    Ok(Json(PageResponse {
        sections: page_document(&sections),
        page,
    }))
}

pub async fn get_section(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
) -> ApiResult<Json<PageContent>> {
    let content = PageContent::get(&state.db, &page, &section).await?;
    Ok(Json(found(content, "Section")?))
}

pub async fn upsert_section(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
    Json(req): Json<UpsertSectionRequest>,
) -> ApiResult<Json<PageContent>> {
    check_name(&page, "page")?;
    check_name(&section, "section")?;

    let content = PageContent::upsert(&state.db, &page, &section, req.content).await?;
    tracing::info!(page = %page, section = %section, "Page content saved");

    Ok(Json(content))
}

pub async fn delete_section(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    if !PageContent::delete(&state.db, &page, &section).await? {
        return Err(ApiError::NotFound("Section not found".to_string()));
    }

    tracing::info!(page = %page, section = %section, "Page content deleted");
    Ok(StatusCode::NO_CONTENT)
}
