//! # Atelier Shared Library
//!
//! Types, persistence and business rules shared by the Atelier API server
//! and the upload client.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: One module per table with its CRUD operations
//! - `auth`: Password hashing, JWT and Axum auth middleware
//! - `ledger`: Token balances and transactions for AI tool access
//! - `analytics`: 30-day pageview aggregation
//! - `chunking`: Chunk planning and progress math for large uploads
//! - `cloudinary`: Cloudinary request signing

pub mod analytics;
pub mod auth;
pub mod chunking;
pub mod cloudinary;
pub mod db;
pub mod ledger;
pub mod models;

/// Current version of the Atelier shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
