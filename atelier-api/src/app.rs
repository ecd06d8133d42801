/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use atelier_api::{app::AppState, config::Config, integrations};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, integrations::http_client()?);
/// let app = atelier_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use atelier_shared::{
    auth::middleware::{create_jwt_middleware, require_admin},
    ledger::TokenLedger,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// HTTP client shared by the third-party integrations
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, http: reqwest::Client) -> Self {
        Self {
            db,
            config: Arc::new(config),
            http,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn ledger(&self) -> TokenLedger {
        TokenLedger::new(self.db.clone())
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                               # public
/// └── /v1/
///     ├── /auth/{register,login,refresh}    # public
///     ├── /portfolio, /artworks, /videos,
///     │   /ai-tools, /pages                 # public reads, admin writes
///     ├── /analytics/pageview[/:id/duration]# public; GET /analytics is admin
///     ├── /payments/webhook                 # public (Stripe signature)
///     ├── /payments/intent, /tokens/*       # authenticated
///     └── /media, /storage, /mux            # admin
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication and admin checks (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let secret = state.jwt_secret().to_string();

    // Layers run outside-in: JWT validation first, then the role check
    let authenticated = || middleware::from_fn(create_jwt_middleware(secret.clone()));
    let admin_only = || middleware::from_fn(require_admin);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let portfolio_routes = Router::new()
        .route("/", get(routes::portfolio::list_items))
        .route("/:id", get(routes::portfolio::get_item))
        .merge(
            Router::new()
                .route("/", post(routes::portfolio::create_item))
                .route(
                    "/:id",
                    patch(routes::portfolio::update_item).delete(routes::portfolio::delete_item),
                )
                .layer(admin_only())
                .layer(authenticated()),
        );

    let artwork_routes = Router::new()
        .route("/", get(routes::artworks::list_artworks))
        .route("/:id", get(routes::artworks::get_artwork))
        .route(
            "/:id/interactions",
            get(routes::artworks::list_interactions).post(routes::artworks::record_interaction),
        )
        .merge(
            Router::new()
                .route("/", post(routes::artworks::create_artwork))
                .route(
                    "/:id",
                    patch(routes::artworks::update_artwork).delete(routes::artworks::delete_artwork),
                )
                .layer(admin_only())
                .layer(authenticated()),
        );

    let video_routes = Router::new()
        .route("/", get(routes::videos::list_videos))
        .route("/:id", get(routes::videos::get_video))
        .merge(
            Router::new()
                .route("/", post(routes::videos::create_video))
                .route(
                    "/:id",
                    patch(routes::videos::update_video).delete(routes::videos::delete_video),
                )
                .route("/:id/mux", post(routes::videos::attach_mux_asset))
                .route("/:id/mux/sync", post(routes::videos::sync_mux_asset))
                .layer(admin_only())
                .layer(authenticated()),
        );

    let mux_routes = Router::new()
        .route("/uploads", get(routes::videos::create_mux_upload))
        .layer(admin_only())
        .layer(authenticated());

    let ai_tool_routes = Router::new()
        .route("/", get(routes::ai_tools::list_tools))
        .merge(
            Router::new()
                .route("/", post(routes::ai_tools::create_tool))
                .route(
                    "/:id",
                    patch(routes::ai_tools::update_tool).delete(routes::ai_tools::delete_tool),
                )
                .layer(admin_only())
                .layer(authenticated()),
        );

    let page_routes = Router::new()
        .route("/:page", get(routes::pages::get_page))
        .route("/:page/:section", get(routes::pages::get_section))
        .merge(
            Router::new()
                .route(
                    "/:page/:section",
                    put(routes::pages::upsert_section).delete(routes::pages::delete_section),
                )
                .layer(admin_only())
                .layer(authenticated()),
        );

    let analytics_routes = Router::new()
        .route("/pageview", post(routes::analytics::record_pageview))
        .route("/pageview/:id/duration", post(routes::analytics::record_duration))
        .merge(
            Router::new()
                .route("/", get(routes::analytics::get_analytics))
                .layer(admin_only())
                .layer(authenticated()),
        );

    let payment_routes = Router::new()
        .route("/webhook", post(routes::payments::stripe_webhook))
        .merge(
            Router::new()
                .route("/intent", post(routes::payments::create_intent))
                .layer(authenticated()),
        );

    let token_routes = Router::new()
        .route("/balance", get(routes::tokens::get_balance))
        .route("/history", get(routes::tokens::get_history))
        .route("/use", post(routes::tokens::use_tool))
        .route("/purchase", post(routes::tokens::confirm_purchase))
        .merge(
            Router::new()
                .route("/adjust", post(routes::tokens::adjust_balance))
                .layer(admin_only()),
        )
        .layer(authenticated());

    let media_routes = Router::new()
        .route("/sign", post(routes::media::sign_upload))
        .route(
            "/upload",
            post(routes::media::upload_media).layer(DefaultBodyLimit::max(
                routes::media::MAX_DIRECT_UPLOAD_BYTES + routes::media::MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route("/:public_id", delete(routes::media::delete_media))
        .layer(admin_only())
        .layer(authenticated());

    let storage_routes = Router::new()
        .route("/presign", post(routes::storage::presign_upload))
        .layer(admin_only())
        .layer(authenticated());

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/portfolio", portfolio_routes)
        .nest("/artworks", artwork_routes)
        .nest("/videos", video_routes)
        .nest("/mux", mux_routes)
        .nest("/ai-tools", ai_tool_routes)
        .nest("/pages", page_routes)
        .nest("/analytics", analytics_routes)
        .nest("/payments", payment_routes)
        .nest("/tokens", token_routes)
        .nest("/media", media_routes)
        .nest("/storage", storage_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive CORS when no origins are configured, otherwise an allow-list
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
