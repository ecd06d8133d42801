//! # Atelier API Server
//!
//! Backend for the portfolio site: gallery and CMS content, the AI-tool
//! token ledger, Stripe purchases, media uploads and page analytics.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/atelier JWT_SECRET=... cargo run -p atelier-api
//! ```

use atelier_api::{app, config::Config, integrations};
use atelier_shared::{
    auth::password,
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::{CreateUser, User, UserRole},
};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Atelier API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    if !config.api.production {
        ensure_database_exists(&config.database.url).await?;
    }

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::from_url(&config.database.url)
    })
    .await?;

    run_migrations(&pool).await?;
    bootstrap_admin(&pool, &config).await?;

    let address = config.bind_address();
    let state = app::AppState::new(pool.clone(), config, integrations::http_client()?);
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Creates the configured admin account on an empty database
async fn bootstrap_admin(pool: &PgPool, config: &Config) -> anyhow::Result<()> {
    let Some(admin) = &config.admin else {
        return Ok(());
    };

    if User::count(pool).await? > 0 {
        return Ok(());
    }

    let user = User::create(
        pool,
        CreateUser {
            email: admin.email.trim().to_lowercase(),
            password_hash: password::hash_password(&admin.password)?,
            name: Some("Admin".to_string()),
            role: UserRole::Admin,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
