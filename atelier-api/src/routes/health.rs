/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "integrations": {"cloudinary": true, "mux": false, ...}
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use atelier_shared::db::pool;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// Which optional integrations are configured
    pub integrations: IntegrationStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IntegrationStatus {
    pub cloudinary: bool,
    pub mux: bool,
    pub stripe: bool,
    pub storage: bool,
    pub mixpanel: bool,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = pool::health_check(&state.db).await.is_ok();
    let config = &state.config;

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        integrations: IntegrationStatus {
            cloudinary: config.cloudinary.is_some(),
            mux: config.mux.is_some(),
            stripe: config.stripe.is_some(),
            storage: config.storage.is_some(),
            mixpanel: config.mixpanel.is_some(),
        },
    }))
}
