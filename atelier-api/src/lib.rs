/// Atelier API server library
///
/// HTTP API for the portfolio site: gallery content, CMS pages, the token
/// ledger, payments, media uploads and analytics.
///
/// # Modules
///
/// - `app`: Application state and router
/// - `config`: Configuration management
/// - `error`: Error handling and HTTP responses
/// - `integrations`: Cloudinary, Mux, Stripe, S3/B2 and Mixpanel clients
/// - `middleware`: Security headers
/// - `routes`: HTTP route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod integrations;
pub mod middleware;
pub mod routes;

/// API version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
