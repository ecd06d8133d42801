/// Database models for Atelier
///
/// One file per table, each with its CRUD operations.
///
/// # Models
///
/// - `user`: Accounts and roles
/// - `video`: Mux-backed videos
/// - `portfolio`: Gallery items
/// - `token`: Token balances and the transaction log
/// - `artwork`: Shop artworks
/// - `interaction`: Views, likes and shares of artworks
/// - `ai_tool`: Token-gated tools
/// - `page_content`: CMS sections and site settings
/// - `analytics`: Raw page views
///
/// # Example
///
/// ```no_run
/// use atelier_shared::models::portfolio::{PortfolioFilter, PortfolioItem};
/// use atelier_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let featured = PortfolioItem::list(
///     &pool,
///     PortfolioFilter { category: None, featured: Some(true) },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod ai_tool;
pub mod analytics;
pub mod artwork;
pub mod interaction;
pub mod page_content;
pub mod portfolio;
pub mod token;
pub mod user;
pub mod video;
