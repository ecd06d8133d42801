/// First-party page analytics
///
/// - `POST /v1/analytics/pageview` - Record a view, returns its id
/// - `POST /v1/analytics/pageview/:id/duration` - Report how long the page stayed open
/// - `GET /v1/analytics` - 30-day summary (admin)
///
/// When Mixpanel is configured, each view is also forwarded there in the
/// background.

use super::parse_id;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    integrations::mixpanel::{spawn_page_view, PageViewEvent},
};
use atelier_shared::{
    analytics::{self, AnalyticsSummary},
    models::analytics::{CreatePageView, PageView},
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Longest stored user agent
const MAX_USER_AGENT_LEN: usize = 512;

/// Longest reported time on page
pub const MAX_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Deserialize, Validate)]
pub struct PageViewRequest {
    #[validate(length(min = 1, max = 512, message = "Page must be 1-512 characters"))]
    pub page: String,

    #[validate(length(max = 255, message = "Visitor id must be at most 255 characters"))]
    pub visitor_id: Option<String>,

    #[validate(length(max = 255, message = "Session id must be at most 255 characters"))]
    pub session_id: Option<String>,

    #[validate(length(max = 1024, message = "Referrer must be at most 1024 characters"))]
    pub referrer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageViewResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DurationRequest {
    #[validate(range(
        min = 0,
        max = MAX_DURATION_MS,
        message = "Duration must be between 0 and 24 hours"
    ))]
    pub duration_ms: i64,
}

pub async fn record_pageview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PageViewRequest>,
) -> ApiResult<(StatusCode, Json<PageViewResponse>)> {
    req.validate()?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect::<String>());

    let view = PageView::record_pageview(
        &state.db,
        CreatePageView {
            page: req.page,
            visitor_id: req.visitor_id,
            session_id: req.session_id,
            referrer: req.referrer,
            user_agent,
        },
    )
    .await?;

    if let Some(mixpanel) = &state.config.mixpanel {
        spawn_page_view(
            state.http.clone(),
            mixpanel.clone(),
            PageViewEvent {
                page: view.page.clone(),
                distinct_id: view.visitor_id.clone(),
                referrer: view.referrer.clone(),
                time: view.created_at,
                insert_id: view.id.simple().to_string(),
            },
        );
    }

    Ok((StatusCode::CREATED, Json(PageViewResponse { id: view.id })))
}

pub async fn record_duration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DurationRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    let id = parse_id(&id, "Page view")?;

    if !PageView::record_duration(&state.db, id, req.duration_ms).await? {
        return Err(ApiError::NotFound("Page view not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_analytics(State(state): State<AppState>) -> ApiResult<Json<AnalyticsSummary>> {
    Ok(Json(analytics::get_analytics(&state.db, Utc::now()).await?))
}
